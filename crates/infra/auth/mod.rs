pub mod youtube_oauth;
