pub mod evaluate;
pub mod model;
pub mod util;
