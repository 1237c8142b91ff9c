pub mod typing_sweep;

pub use typing_sweep::TypingSweepWorker;
