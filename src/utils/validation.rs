use crate::error::Result;
use validator::Validate;

pub fn validated<T: Validate>(val: T) -> Result<T> {
    val.validate()?;
    Ok(val)
}
