// FFmpeg Decoder 모듈 (ffmpeg-next)
// 아키텍처: 패킷 → 디코더 → 프레임 순차 읽기 + 컨테이너 seek (프레임 번호 계산은 SeekEngine 담당)

use ffmpeg_next as ffmpeg;
use std::path::Path;

use super::converter::Yuv420Converter;
use crate::error::PlayerError;
use crate::playback::{DecodedFrame, Decoder, StreamInfo};

/// AV_TIME_BASE (마이크로초)
const MICROS_PER_SECOND: i128 = 1_000_000;

/// 비디오 디코더 (ffmpeg-next)
pub struct FfmpegDecoder {
    input_ctx: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    info: StreamInfo,
    /// 마지막으로 보낸 비디오 패킷의 duration (0이면 프레임레이트로 대체)
    last_packet_duration: i64,
    /// send_eof 이후 남은 프레임만 꺼내는 중
    draining: bool,
}

impl FfmpegDecoder {
    /// Decoder 생성 (Multi-threading)
    fn try_create_decoder(
        codec_params: ffmpeg::codec::Parameters,
    ) -> Result<ffmpeg::codec::decoder::Video, PlayerError> {
        let mut context = ffmpeg::codec::context::Context::from_parameters(codec_params)
            .map_err(|e| PlayerError::Codec(format!("failed to create context: {}", e)))?;

        // 디코더당 최대 4스레드
        if let Ok(parallelism) = std::thread::available_parallelism() {
            let thread_count = parallelism.get().min(4);
            context.set_threading(ffmpeg::threading::Config {
                kind: ffmpeg::threading::Type::Frame,
                count: thread_count,
            });
        }

        context
            .decoder()
            .video()
            .map_err(|e| PlayerError::Codec(format!("failed to get video decoder: {}", e)))
    }

    /// 비디오 파일 열기
    pub fn open(file_path: &Path) -> Result<Self, PlayerError> {
        let open_error = |reason: String| PlayerError::Open {
            path: file_path.display().to_string(),
            reason,
        };

        ffmpeg::init().map_err(|e| open_error(format!("FFmpeg init failed: {}", e)))?;

        // FFmpeg 자체 로그는 에러만 (seek 추적 빌드에서는 전부 출력)
        #[cfg(not(feature = "debug_log"))]
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);

        // 1차 시도: 기본 오픈
        // 2차 시도: moov atom이 파일 끝에 있는 경우: probesize 확장
        let input_ctx = ffmpeg::format::input(&file_path)
            .or_else(|_| {
                let mut opts = ffmpeg::Dictionary::new();
                opts.set("probesize", "100000000"); // 100MB
                opts.set("analyzeduration", "30000000"); // 30초
                ffmpeg::format::input_with_dictionary(&file_path, opts)
            })
            .map_err(|e| open_error(e.to_string()))?;

        let video_stream = input_ctx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(PlayerError::NoVideoStream)?;

        let video_stream_index = video_stream.index();
        let time_base = video_stream.time_base();
        let frame_rate = video_stream.avg_frame_rate();
        let decoder = Self::try_create_decoder(video_stream.parameters())?;

        if decoder.width() == 0 || decoder.height() == 0 {
            return Err(PlayerError::Codec(format!(
                "invalid frame size {}x{}",
                decoder.width(),
                decoder.height()
            )));
        }

        let info = StreamInfo {
            width: decoder.width(),
            height: decoder.height(),
            time_base_num: time_base.numerator(),
            time_base_den: time_base.denominator(),
            frame_rate: (frame_rate.numerator() > 0 && frame_rate.denominator() > 0)
                .then(|| (frame_rate.numerator(), frame_rate.denominator())),
        };

        log::info!("stream {} contains video data", video_stream_index);
        log::info!(
            "codec w: {} h: {}, time base {}/{}",
            info.width,
            info.height,
            info.time_base_num,
            info.time_base_den
        );
        if log::log_enabled!(log::Level::Debug) {
            ffmpeg::format::context::input::dump(&input_ctx, 0, file_path.to_str());
        }

        Ok(Self {
            input_ctx,
            video_stream_index,
            decoder,
            info,
            last_packet_duration: 0,
            draining: false,
        })
    }

    /// 이 스트림의 픽셀 포맷에 맞는 YUV420P 변환기
    pub fn converter(&self) -> Result<Yuv420Converter, PlayerError> {
        Yuv420Converter::new(self.decoder.format(), self.info.width, self.info.height)
    }

    /// 다음 비디오 패킷을 디코더에 전달. 패킷이 없으면 EOF 전송 후 drain 모드
    fn send_next_packet(&mut self) -> Result<(), PlayerError> {
        for (stream, packet) in self.input_ctx.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }

            if packet.duration() > 0 {
                self.last_packet_duration = packet.duration();
            }
            return self
                .decoder
                .send_packet(&packet)
                .map_err(|e| PlayerError::Decode(e.to_string()));
        }

        // for 루프 자연종료 = 패킷 소진 = EOF
        self.draining = true;
        self.decoder
            .send_eof()
            .map_err(|e| PlayerError::Decode(e.to_string()))
    }

    fn duration_hint(&self) -> i64 {
        if self.last_packet_duration > 0 {
            self.last_packet_duration
        } else {
            self.info.ticks_per_frame().unwrap_or(0)
        }
    }

    /// 스트림 time_base pts → AV_TIME_BASE (input_ctx.seek은 stream_index = -1로 동작)
    fn pts_to_micros(&self, pts: i64) -> i64 {
        stream_pts_to_micros(pts, self.info.time_base_num, self.info.time_base_den)
    }
}

impl Decoder for FfmpegDecoder {
    type Raw = ffmpeg::frame::Video;

    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_next_video_frame(&mut self) -> Result<DecodedFrame<Self::Raw>, PlayerError> {
        loop {
            // 디코더 버퍼에 남은 프레임 먼저 (B-frame 재정렬 대응)
            let mut frame = ffmpeg::frame::Video::empty();
            if self.decoder.receive_frame(&mut frame).is_ok() {
                let pts = frame
                    .timestamp()
                    .or(frame.pts())
                    .ok_or_else(|| PlayerError::Decode("decoded frame has no timestamp".into()))?;
                return Ok(DecodedFrame {
                    pts,
                    duration_hint: self.duration_hint(),
                    is_key: frame.is_key(),
                    raw: frame,
                });
            }

            if self.draining {
                return Err(PlayerError::EndOfStream);
            }
            self.send_next_packet()?;
        }
    }

    fn seek(&mut self, pts: i64, backward: bool) -> Result<(), PlayerError> {
        let timestamp_us = self.pts_to_micros(pts);

        self.decoder.flush();
        let result = if backward {
            // 목표 이하 키프레임
            self.input_ctx.seek(timestamp_us, ..=timestamp_us)
        } else {
            self.input_ctx.seek(timestamp_us, ..)
        };
        self.decoder.flush();
        self.draining = false;

        result.map_err(|e| PlayerError::Seek(format!("pts {} ({}us): {}", pts, timestamp_us, e)))
    }
}

fn stream_pts_to_micros(pts: i64, time_base_num: i32, time_base_den: i32) -> i64 {
    if time_base_den == 0 {
        return pts;
    }
    (i128::from(pts) * i128::from(time_base_num) * MICROS_PER_SECOND / i128::from(time_base_den))
        as i64
}
