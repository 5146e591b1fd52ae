pub mod generation;
pub mod publishing;
pub mod rendering;
pub mod topic_history;
pub mod upload_channel;
