pub mod envelope;
pub mod work_item;
