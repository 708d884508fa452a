pub mod dct_ops;
