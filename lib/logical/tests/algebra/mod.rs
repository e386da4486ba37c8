mod builder;
mod optimizer;
