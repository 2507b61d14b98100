// FFmpeg 연동 모듈
// 컨테이너/코덱 디코딩 + YUV420P 변환

pub mod converter;
pub mod decoder;

pub use converter::Yuv420Converter;
pub use decoder::FfmpegDecoder;
