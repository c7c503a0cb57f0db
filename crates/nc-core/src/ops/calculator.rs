//! The `calculator` service: numpy-style reductions, cumulative ops and
//! element-wise math over a flat array.

use nc_stats::{descriptive, elementwise};

use crate::params::Params;
use crate::registry::{Operation, Registry};
use crate::result::RawResult;

type OpResult = nc_stats::Result<RawResult>;

/// Allow-list of the calculator service.
pub static CALCULATOR: Registry = Registry::new(
    "calculator",
    &[
        ("sum", Operation::Flat(sum)),
        ("mean", Operation::Flat(mean)),
        ("std", Operation::Flat(std)),
        ("min", Operation::Flat(min)),
        ("max", Operation::Flat(max)),
        ("median", Operation::Flat(median)),
        ("prod", Operation::Flat(prod)),
        ("var", Operation::Flat(var)),
        ("cumsum", Operation::Flat(cumsum)),
        ("cumprod", Operation::Flat(cumprod)),
        ("diff", Operation::Flat(diff)),
        ("abs", Operation::Flat(abs)),
        ("sqrt", Operation::Flat(sqrt)),
        ("log", Operation::Flat(log)),
        ("log10", Operation::Flat(log10)),
        ("exp", Operation::Flat(exp)),
        ("floor", Operation::Flat(floor)),
        ("ceil", Operation::Flat(ceil)),
        ("round", Operation::Flat(round)),
        ("sin", Operation::Flat(sin)),
        ("cos", Operation::Flat(cos)),
        ("tan", Operation::Flat(tan)),
        ("arcsin", Operation::Flat(arcsin)),
        ("arccos", Operation::Flat(arccos)),
        ("arctan", Operation::Flat(arctan)),
        ("square", Operation::Flat(square)),
        ("percentile", Operation::Flat(percentile)),
    ],
);

/// Glue for a parameterless library routine.
macro_rules! plain {
    ($($name:ident => $path:path),* $(,)?) => {
        $(
            fn $name(x: &[f64], params: &Params) -> OpResult {
                params.accept(&[])?;
                Ok($path(x)?.into())
            }
        )*
    };
}

plain! {
    sum => descriptive::sum,
    mean => descriptive::mean,
    min => descriptive::min,
    max => descriptive::max,
    median => descriptive::median,
    prod => descriptive::prod,
    cumsum => descriptive::cumsum,
    cumprod => descriptive::cumprod,
    abs => elementwise::abs,
    sqrt => elementwise::sqrt,
    log => elementwise::log,
    log10 => elementwise::log10,
    exp => elementwise::exp,
    floor => elementwise::floor,
    ceil => elementwise::ceil,
    sin => elementwise::sin,
    cos => elementwise::cos,
    tan => elementwise::tan,
    arcsin => elementwise::arcsin,
    arccos => elementwise::arccos,
    arctan => elementwise::arctan,
    square => elementwise::square,
}

fn std(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["ddof"])?;
    Ok(descriptive::std(x, params.f64_or("ddof", 0.0)?)?.into())
}

fn var(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["ddof"])?;
    Ok(descriptive::var(x, params.f64_or("ddof", 0.0)?)?.into())
}

fn diff(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["n"])?;
    Ok(descriptive::diff(x, params.usize_or("n", 1)?)?.into())
}

fn round(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["decimals"])?;
    Ok(elementwise::round(x, params.i32_or("decimals", 0)?)?.into())
}

fn percentile(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["q"])?;
    Ok(descriptive::percentile(x, params.f64_required("q")?)?.into())
}
