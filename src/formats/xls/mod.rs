mod cell;
mod sheet;
mod util;

pub use self::cell::*;
pub use self::sheet::*;
pub use self::util::*;
