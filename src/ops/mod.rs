pub mod check;
pub mod device_ops;
pub mod reorder_ops;
