#![allow(dead_code)]

mod mock_collaborators;

pub use mock_collaborators::*;
