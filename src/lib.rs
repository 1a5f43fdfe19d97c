// Basic ISA types (opcodes, machine words, the image codec) that are used everywhere:
pub mod isa;

// Assembly module to create a machine image from source text:
pub mod assembly;

// The machine and its units:
pub mod machine;
pub mod unit;

// Helper modules for micro-step sequencing and memory-mapped I/O:
pub mod micro;
pub mod io;
