//! Symbols and externs that `shalloc` depends on.
//!
//! This crate provides implementation/import of these in Linux, BSD, and Mac OS.

#![no_std]
#![warn(missing_docs)]

extern crate libc;

pub mod config;
pub mod log;
pub mod syscalls;
