mod common;
mod vehicles;
