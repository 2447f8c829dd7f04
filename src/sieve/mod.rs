pub mod action;
pub mod ast;
pub mod check;
pub mod combiner;
pub mod condition;
pub mod emitter;
pub mod generator;
pub mod lexer;
