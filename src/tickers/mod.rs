pub mod relayer;
pub mod relayer_tasks;
