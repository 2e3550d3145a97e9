mod common;
mod proof;
mod relay;
