pub(crate) mod quadratic;

pub(crate) use quadratic::Quadratic;
