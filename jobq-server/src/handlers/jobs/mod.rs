pub mod submit;

pub mod dto;
