use std::process::ExitCode;
use std::time::Instant;

use hybrid_fft::accelerator::CubeAccelerator;
use hybrid_fft::spectrum::{generate_sine_wave, spectral_peaks};
use hybrid_fft::{Fft, FinishStrategy, HybridOptions};
use num_complex::Complex32;

type Runtime = cubecl::wgpu::WgpuRuntime;

const SAMPLE_RATE: f32 = 44_100.0;
const FRAME: usize = 1 << 16;

pub fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    // Two tones: A4 and a quieter E5.
    let a4 = generate_sine_wave(440.0f32, SAMPLE_RATE, FRAME);
    let e5 = generate_sine_wave(659.25f32, SAMPLE_RATE, FRAME);
    let frame: Vec<Complex32> = a4.iter().zip(&e5).map(|(a, e)| a + e * 0.5).collect();

    let mut fft = Fft::<f32>::new(FRAME, false);
    let start_time = Instant::now();
    let host = fft.transform(&frame).to_vec();
    log::info!("host transform of {FRAME} samples: {:?}", start_time.elapsed());

    let mut device = CubeAccelerator::<Runtime>::new(Default::default());
    for finish in [FinishStrategy::Host, FinishStrategy::DeviceResubmit] {
        let options = HybridOptions::new(1024).with_finish(finish);
        let start_time = Instant::now();
        let spectrum = match fft.transform_hybrid(&frame, &mut device, options) {
            Ok(spectrum) => spectrum,
            Err(err) => {
                // Device failures are fatal for this tool: no retry, no fallback.
                log::error!("{err}");
                return ExitCode::FAILURE;
            }
        };
        let max_diff = spectrum
            .iter()
            .zip(&host)
            .map(|(d, h)| (d - h).norm())
            .fold(0.0f32, f32::max);
        log::info!(
            "hybrid ({finish:?} finish): {:?}, max deviation from host {max_diff:.2e}",
            start_time.elapsed()
        );
    }

    for peak in spectral_peaks(&host, SAMPLE_RATE, 2e-2) {
        println!("{:>10.2} Hz  (bin {:>5})  power {:.4}", peak.frequency, peak.bin, peak.power);
    }
    ExitCode::SUCCESS
}
