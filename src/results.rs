mod record;
mod result_set;

pub use record::{FieldMap, Record};
pub use result_set::{ResultSet, RowList};
