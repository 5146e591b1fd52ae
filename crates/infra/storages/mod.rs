pub mod s3;
pub mod topic_history;
