// In-process stand-in for a GPU queue.
// Executes the same kernels as `crate::kernels`, in f32, one work item at a
// time. Commands are queued and only run on `barrier()` or a blocking `read()`,
// the way an in-order device queue behaves.
use std::collections::{HashMap, VecDeque};
use std::f32::consts::PI;

use num_complex::Complex32;

use super::{Accelerator, DeviceBuffer, Kernel};
use crate::error::DeviceStatus;
use crate::MAX_GROUP_POINTS;

/// One entry of the operation log kept by [`EmulatedAccelerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Write(DeviceBuffer),
    Dispatch(Kernel),
    Barrier,
    Read(DeviceBuffer),
    Release(DeviceBuffer),
}

enum Command {
    Write(DeviceBuffer, Vec<u8>),
    Release(DeviceBuffer),
    Dispatch {
        kernel: Kernel,
        global: usize,
        local: usize,
    },
}

#[derive(Default)]
pub struct EmulatedAccelerator {
    max_group_points: Option<usize>,
    buffers: HashMap<DeviceBuffer, Vec<u8>>,
    queue: VecDeque<Command>,
    ops: Vec<Op>,
}

impl EmulatedAccelerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulates a device whose work groups fuse at most `points` points.
    pub fn with_max_group_points(points: usize) -> Self {
        Self {
            max_group_points: Some(points),
            ..Self::default()
        }
    }

    /// Every operation issued so far, in order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Commands enqueued but not yet executed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn drain(&mut self) -> Result<(), DeviceStatus> {
        while let Some(command) = self.queue.pop_front() {
            match command {
                Command::Write(buffer, data) => {
                    self.buffers.insert(buffer, data);
                }
                Command::Release(buffer) => {
                    self.buffers.remove(&buffer);
                }
                Command::Dispatch {
                    kernel,
                    global,
                    local,
                } => self.execute(kernel, global, local)?,
            }
        }
        Ok(())
    }

    fn scalar<P: bytemuck::Pod>(&self, buffer: DeviceBuffer, name: &'static str) -> Result<P, DeviceStatus> {
        let bytes = self
            .buffers
            .get(&buffer)
            .ok_or(DeviceStatus::MissingParameter(name))?;
        if bytes.len() != std::mem::size_of::<P>() {
            return Err(DeviceStatus::SizeMismatch {
                device: bytes.len(),
                host: std::mem::size_of::<P>(),
            });
        }
        Ok(bytemuck::pod_read_unaligned(bytes.as_slice()))
    }

    fn execute(&mut self, kernel: Kernel, global: usize, local: usize) -> Result<(), DeviceStatus> {
        let mut data = records(
            self.buffers
                .get(&DeviceBuffer::Samples)
                .ok_or(DeviceStatus::UnknownBuffer)?,
        )?;
        let direction = self.scalar::<i32>(DeviceBuffer::Direction, "direction")?;
        let n = data.len();
        let mut debug = match self.buffers.get(&DeviceBuffer::Debug) {
            Some(bytes) if bytes.len() != std::mem::size_of_val(data.as_slice()) => {
                return Err(DeviceStatus::SizeMismatch {
                    device: bytes.len(),
                    host: std::mem::size_of_val(data.as_slice()),
                });
            }
            Some(bytes) => Some(records(bytes)?),
            None => None,
        };

        let items = global.min(n / 2);
        match kernel {
            Kernel::GroupStages => {
                let points = self.scalar::<u32>(DeviceBuffer::PointsPerGroup, "points per group")? as usize;
                if points / 2 != local {
                    return Err(DeviceStatus::InvalidWorkSize { global, local });
                }
                let mut hs = 1;
                while hs < points {
                    // Work items of one stage touch disjoint pairs, so running
                    // them one after another matches the parallel result.
                    for tid in 0..items {
                        let local_id = tid % local;
                        let base = (tid / local) * points;
                        let k = local_id % hs;
                        let i = base + (local_id / hs) * (hs * 2) + k;
                        let w = butterfly(&mut data, i, i + hs, k, hs, direction);
                        if let Some(debug) = debug.as_mut() {
                            debug[tid] = w;
                        }
                    }
                    hs *= 2;
                }
            }
            Kernel::SingleStage => {
                let m = self.scalar::<u32>(DeviceBuffer::StageSize, "stage size")? as usize;
                if m < 2 || m > n {
                    return Err(DeviceStatus::InvalidWorkSize { global, local });
                }
                let hs = m / 2;
                for tid in 0..items {
                    let k = tid % hs;
                    let i = (tid / hs) * m + k;
                    let w = butterfly(&mut data, i, i + hs, k, hs, direction);
                    if let Some(debug) = debug.as_mut() {
                        debug[tid] = w;
                    }
                }
            }
        }

        self.buffers
            .insert(DeviceBuffer::Samples, bytemuck::cast_slice(&data).to_vec());
        if let Some(debug) = debug {
            self.buffers
                .insert(DeviceBuffer::Debug, bytemuck::cast_slice(&debug).to_vec());
        }
        Ok(())
    }
}

/// Copies packed `(re, im)` records out of a byte buffer.
fn records(bytes: &[u8]) -> Result<Vec<Complex32>, DeviceStatus> {
    let record = std::mem::size_of::<Complex32>();
    if bytes.len() % record != 0 {
        return Err(DeviceStatus::SizeMismatch {
            device: bytes.len(),
            host: bytes.len() / record * record,
        });
    }
    Ok(bytes
        .chunks_exact(record)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

/// One butterfly with a directly evaluated twiddle, as the device kernels do.
fn butterfly(data: &mut [Complex32], i: usize, j: usize, k: usize, hs: usize, direction: i32) -> Complex32 {
    let angle = -(direction as f32) * PI * k as f32 / hs as f32;
    let w = Complex32::cis(angle);
    let u = data[i];
    let v = w * data[j];
    data[i] = u + v;
    data[j] = u - v;
    w
}

impl Accelerator for EmulatedAccelerator {
    fn write(&mut self, buffer: DeviceBuffer, data: &[u8]) -> Result<(), DeviceStatus> {
        self.ops.push(Op::Write(buffer));
        self.queue.push_back(Command::Write(buffer, data.to_vec()));
        Ok(())
    }

    fn dispatch(&mut self, kernel: Kernel, global_size: usize, local_size: usize) -> Result<(), DeviceStatus> {
        self.ops.push(Op::Dispatch(kernel));
        if local_size == 0 || global_size % local_size != 0 || local_size * 2 > self.max_group_points() {
            return Err(DeviceStatus::InvalidWorkSize {
                global: global_size,
                local: local_size,
            });
        }
        self.queue.push_back(Command::Dispatch {
            kernel,
            global: global_size,
            local: local_size,
        });
        Ok(())
    }

    fn barrier(&mut self) -> Result<(), DeviceStatus> {
        self.ops.push(Op::Barrier);
        self.drain()
    }

    fn read(&mut self, buffer: DeviceBuffer, out: &mut [u8]) -> Result<(), DeviceStatus> {
        self.ops.push(Op::Read(buffer));
        self.drain()?;
        let bytes = self.buffers.get(&buffer).ok_or(DeviceStatus::UnknownBuffer)?;
        if bytes.len() != out.len() {
            return Err(DeviceStatus::SizeMismatch {
                device: bytes.len(),
                host: out.len(),
            });
        }
        out.copy_from_slice(bytes);
        Ok(())
    }

    fn release(&mut self, buffer: DeviceBuffer) {
        self.ops.push(Op::Release(buffer));
        self.queue.push_back(Command::Release(buffer));
    }

    fn max_group_points(&self) -> usize {
        self.max_group_points.unwrap_or(MAX_GROUP_POINTS)
    }
}
