use std::collections::HashMap;

use cubecl::prelude::*;
use cubecl::server::Handle;

use super::{Accelerator, DeviceBuffer, Kernel};
use crate::error::DeviceStatus;
use crate::kernels::{group_stages, single_stage};
use crate::{MAX_GROUP_POINTS, WORKGROUP_SIZE};

struct Slot {
    handle: Handle,
    bytes: usize,
}

/// [`Accelerator`] backed by a CubeCL runtime (wgpu or CUDA).
///
/// Each `write` uploads into a fresh device allocation that replaces the
/// previous one for that buffer. Launches are queued on the runtime's stream;
/// `barrier` waits for the stream to drain and `read` blocks on the download.
///
/// # Example
///
/// ```no_run
/// use cubecl::wgpu::WgpuRuntime;
/// use hybrid_fft::accelerator::CubeAccelerator;
/// use hybrid_fft::{Fft, HybridOptions};
/// use num_complex::Complex64;
///
/// let mut device = CubeAccelerator::<WgpuRuntime>::new(Default::default());
/// let mut fft = Fft::<f64>::new(1024, false);
/// let samples = vec![Complex64::new(1.0, 0.0); 1024];
/// let spectrum = fft.transform_hybrid(&samples, &mut device, HybridOptions::default())?;
/// # Ok::<(), hybrid_fft::FftError>(())
/// ```
pub struct CubeAccelerator<R: Runtime> {
    device: R::Device,
    slots: HashMap<DeviceBuffer, Slot>,
}

impl<R: Runtime> CubeAccelerator<R> {
    pub fn new(device: R::Device) -> Self {
        Self {
            device,
            slots: HashMap::new(),
        }
    }

    fn slot(&self, buffer: DeviceBuffer) -> Result<&Slot, DeviceStatus> {
        self.slots.get(&buffer).ok_or(match buffer {
            DeviceBuffer::Samples | DeviceBuffer::Debug => DeviceStatus::UnknownBuffer,
            DeviceBuffer::PointsPerGroup => DeviceStatus::MissingParameter("points per group"),
            DeviceBuffer::Direction => DeviceStatus::MissingParameter("direction"),
            DeviceBuffer::StageSize => DeviceStatus::MissingParameter("stage size"),
        })
    }
}

impl<R: Runtime> Accelerator for CubeAccelerator<R> {
    fn write(&mut self, buffer: DeviceBuffer, data: &[u8]) -> Result<(), DeviceStatus> {
        let client = R::client(&self.device);
        let handle = client.create_from_slice(data);
        self.slots.insert(
            buffer,
            Slot {
                handle,
                bytes: data.len(),
            },
        );
        Ok(())
    }

    fn dispatch(&mut self, kernel: Kernel, global_size: usize, local_size: usize) -> Result<(), DeviceStatus> {
        if local_size == 0 || global_size % local_size != 0 || local_size > WORKGROUP_SIZE as usize {
            return Err(DeviceStatus::InvalidWorkSize {
                global: global_size,
                local: local_size,
            });
        }

        let client = R::client(&self.device);
        let samples = self.slot(DeviceBuffer::Samples)?;
        let direction = self.slot(DeviceBuffer::Direction)?;
        let scalars = samples.bytes / core::mem::size_of::<f32>();

        // Kernels always take a debug array; without a captured one they get
        // a single-scalar placeholder they never touch.
        let placeholder;
        let (debug, debug_len, capture_debug) = match self.slots.get(&DeviceBuffer::Debug) {
            Some(slot) => (&slot.handle, slot.bytes / core::mem::size_of::<f32>(), true),
            None => {
                placeholder = client.empty(core::mem::size_of::<f32>());
                (&placeholder, 1, false)
            }
        };

        let cube_count = CubeCount::Static((global_size / local_size) as u32, 1, 1);
        let cube_dim = CubeDim::new_1d(local_size as u32);

        let launched = match kernel {
            Kernel::GroupStages => {
                let points = self.slot(DeviceBuffer::PointsPerGroup)?;
                unsafe {
                    group_stages::launch::<f32, R>(
                        &client,
                        cube_count,
                        cube_dim,
                        ArrayArg::from_raw_parts::<f32>(&samples.handle, scalars, 1),
                        ArrayArg::from_raw_parts::<u32>(&points.handle, 1, 1),
                        ArrayArg::from_raw_parts::<i32>(&direction.handle, 1, 1),
                        ArrayArg::from_raw_parts::<f32>(debug, debug_len, 1),
                        capture_debug, // comptime
                    )
                }
            }
            Kernel::SingleStage => {
                let stage_size = self.slot(DeviceBuffer::StageSize)?;
                unsafe {
                    single_stage::launch::<f32, R>(
                        &client,
                        cube_count,
                        cube_dim,
                        ArrayArg::from_raw_parts::<f32>(&samples.handle, scalars, 1),
                        ArrayArg::from_raw_parts::<u32>(&stage_size.handle, 1, 1),
                        ArrayArg::from_raw_parts::<i32>(&direction.handle, 1, 1),
                        ArrayArg::from_raw_parts::<f32>(debug, debug_len, 1),
                        capture_debug, // comptime
                    )
                }
            }
        };
        launched.map_err(|err| DeviceStatus::Launch(format!("{err:?}")))
    }

    fn barrier(&mut self) -> Result<(), DeviceStatus> {
        let client = R::client(&self.device);
        cubecl::future::block_on(client.sync());
        Ok(())
    }

    fn read(&mut self, buffer: DeviceBuffer, out: &mut [u8]) -> Result<(), DeviceStatus> {
        let slot = self.slot(buffer)?;
        if slot.bytes != out.len() {
            return Err(DeviceStatus::SizeMismatch {
                device: slot.bytes,
                host: out.len(),
            });
        }
        let client = R::client(&self.device);
        let bytes = client.read_one(slot.handle.clone());
        out.copy_from_slice(&bytes[..]);
        Ok(())
    }

    fn release(&mut self, buffer: DeviceBuffer) {
        // Launches already queued hold their own reference to the handle.
        self.slots.remove(&buffer);
    }

    fn max_group_points(&self) -> usize {
        MAX_GROUP_POINTS
    }
}
