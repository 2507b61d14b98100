// YUV420P (캐시 형식) → RGBA (egui 텍스처)

use crate::error::PlayerError;

/// 빈틈없이 채워진 YUV420P 버퍼를 RGBA로 변환 (ITU-R BT.601)
/// 홀수 크기: 크로마 평면은 w/2 x h/2, 마지막 열/행은 가장자리 샘플 재사용
pub fn yuv420_to_rgba(
    yuv: &[u8],
    width: usize,
    height: usize,
    rgba: &mut Vec<u8>,
) -> Result<(), PlayerError> {
    let y_size = width * height;
    let half_w = width / 2;
    let half_h = height / 2;
    let uv_size = half_w * half_h;

    if yuv.len() < y_size + uv_size * 2 {
        return Err(PlayerError::Display(format!(
            "yuv buffer too small for {}x{}: {} bytes",
            width,
            height,
            yuv.len()
        )));
    }

    let (y_plane, chroma) = yuv.split_at(y_size);
    let (u_plane, v_plane) = chroma.split_at(uv_size);

    rgba.resize(y_size * 4, 0);

    for y in 0..height {
        for x in 0..width {
            let y_val = y_plane[y * width + x] as f32;
            let (u_val, v_val) = if uv_size == 0 {
                (0.0, 0.0)
            } else {
                let uv_idx = (y / 2).min(half_h - 1) * half_w + (x / 2).min(half_w - 1);
                (
                    u_plane[uv_idx] as f32 - 128.0,
                    v_plane[uv_idx] as f32 - 128.0,
                )
            };

            let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
            let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
            let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

            let rgba_idx = (y * width + x) * 4;
            rgba[rgba_idx] = r;
            rgba[rgba_idx + 1] = g;
            rgba[rgba_idx + 2] = b;
            rgba[rgba_idx + 3] = 255;
        }
    }

    Ok(())
}
