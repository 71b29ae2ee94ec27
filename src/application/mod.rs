pub mod cli;
pub mod interactive;
pub mod interrupts;
