use std::{boxed::Box, error::Error as StdError};

pub type BoxedError = Box<dyn StdError + Send + Sync>;
