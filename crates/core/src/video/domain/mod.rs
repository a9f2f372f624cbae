pub mod image_writer;
pub mod reader_guard;
pub mod video_reader;
