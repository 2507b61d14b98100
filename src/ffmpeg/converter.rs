// 픽셀 포맷 변환 - 디코더 네이티브 포맷 → YUV420P (캐시 저장 형식)
// 데이터 레이아웃: [Y plane: w*h][U plane: w/2*h/2][V plane: w/2*h/2]

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling;

use crate::error::PlayerError;
use crate::playback::Converter;

/// swscale 기반 YUV420P 변환기
pub struct Yuv420Converter {
    scaler: scaling::Context,
    scaled: ffmpeg::frame::Video,
    width: u32,
    height: u32,
}

impl Yuv420Converter {
    pub fn new(src_format: Pixel, width: u32, height: u32) -> Result<Self, PlayerError> {
        let scaler = scaling::Context::get(
            src_format,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BICUBIC,
        )
        .map_err(|e| PlayerError::Convert(format!("failed to create scaler: {}", e)))?;

        Ok(Self {
            scaler,
            scaled: ffmpeg::frame::Video::empty(),
            width,
            height,
        })
    }
}

impl Converter<ffmpeg::frame::Video> for Yuv420Converter {
    fn convert(&mut self, raw: &ffmpeg::frame::Video, out: &mut [u8]) -> Result<(), PlayerError> {
        self.scaler
            .run(raw, &mut self.scaled)
            .map_err(|e| PlayerError::Convert(format!("failed to scale frame: {}", e)))?;

        let planes = [
            (self.scaled.data(0), self.scaled.stride(0)),
            (self.scaled.data(1), self.scaled.stride(1)),
            (self.scaled.data(2), self.scaled.stride(2)),
        ];
        pack_yuv420(planes, self.width as usize, self.height as usize, out)
    }
}

/// stride가 있는 Y/U/V 평면을 빈틈없이 `out`에 복사
/// bounds check: 손상된 프레임이어도 panic 대신 Err
pub fn pack_yuv420(
    planes: [(&[u8], usize); 3],
    width: usize,
    height: usize,
    out: &mut [u8],
) -> Result<(), PlayerError> {
    let y_size = width * height;
    let half_w = width / 2;
    let half_h = height / 2;
    let uv_size = half_w * half_h;
    let total = y_size + uv_size * 2;

    if out.len() < total {
        return Err(PlayerError::Convert(format!(
            "output buffer too small: {} < {} ({}x{})",
            out.len(),
            total,
            width,
            height
        )));
    }

    let layout = [
        (0, width, height),
        (y_size, half_w, half_h),
        (y_size + uv_size, half_w, half_h),
    ];

    for (plane, ((src, stride), (dst_offset, row_len, rows))) in planes.iter().zip(layout).enumerate() {
        if rows == 0 || row_len == 0 {
            continue;
        }
        let required = (rows - 1) * stride + row_len;
        if *stride < row_len || src.len() < required {
            return Err(PlayerError::Convert(format!(
                "plane {} too small: got {} bytes, need {} (stride={})",
                plane,
                src.len(),
                required,
                stride
            )));
        }

        for row in 0..rows {
            let src_offset = row * stride;
            let dst = dst_offset + row * row_len;
            out[dst..dst + row_len].copy_from_slice(&src[src_offset..src_offset + row_len]);
        }
    }

    Ok(())
}
