//! GPU offload runtime with a wgpu backend.
//!
//! This module dispatches the vector-addition kernel to whatever adapter
//! wgpu selects (Metal on macOS, Vulkan/DX12 elsewhere) as a fan-out of
//! work items, each covering its own sub-range of the output. Timing comes
//! from device-side begin/end timestamps when the adapter supports them:
//! host-side submission is asynchronous, so a wall clock here would measure
//! queueing delay rather than compute time.

use crate::planner::{GpuAddPlan, GpuPlanner};
use anyhow::{anyhow, ensure, Result};
use bytemuck::{cast_slice, Pod, Zeroable};
use pollster::block_on;
use std::num::NonZeroU64;
use std::sync::mpsc;
use tracing::{info, warn};
use vecbench_kernels::add::{AddStrategy, StrategyResult};
use vecbench_kernels::config::AddProblem;
use vecbench_kernels::timing::StrategyDuration;
use wgpu::util::DeviceExt;

/// Result of one offloaded execution with device timing.
#[derive(Debug, Clone)]
pub struct GpuExecutionResult {
    pub output: Vec<f32>,
    pub duration: StrategyDuration,
}

/// Information about the selected device.
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    pub name: String,
    pub backend: String,
    pub supports_timestamps: bool,
}

pub struct GpuExecutor {
    planner: GpuPlanner,
    context: GpuContext,
}

impl GpuExecutor {
    pub fn new(planner: GpuPlanner) -> Result<Self> {
        let context = GpuContext::new()?;
        Ok(Self { planner, context })
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        &self.context.device_info
    }

    /// Offload one vector addition and block until the device has drained.
    pub fn execute_add(&self, a: &[f32], b: &[f32], workers: usize) -> Result<GpuExecutionResult> {
        ensure!(
            a.len() == b.len(),
            "input length mismatch: {} vs {}",
            a.len(),
            b.len()
        );
        let plan = self.planner.plan_add(AddProblem::new(a.len()), workers)?;
        self.context.run_add(plan, a, b)
    }
}

struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    device_info: GpuDeviceInfo,
    timestamp_query_set: Option<wgpu::QuerySet>,
    timestamp_period: f32,
}

impl GpuContext {
    fn new() -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter found"))?;

        let adapter_info = adapter.get_info();
        let supports_timestamps = adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY);
        if !supports_timestamps {
            warn!("adapter lacks timestamp queries; device timings will be unavailable");
        }

        let required_features = if supports_timestamps {
            wgpu::Features::TIMESTAMP_QUERY
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vecbench GPU device"),
                required_features,
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))?;

        let timestamp_query_set = if supports_timestamps {
            Some(device.create_query_set(&wgpu::QuerySetDescriptor {
                label: Some("timestamp_queries"),
                ty: wgpu::QueryType::Timestamp,
                count: 2, // pass begin and end
            }))
        } else {
            None
        };

        let timestamp_period = if supports_timestamps {
            queue.get_timestamp_period()
        } else {
            0.0
        };

        let device_info = GpuDeviceInfo {
            name: adapter_info.name.clone(),
            backend: format!("{:?}", adapter_info.backend),
            supports_timestamps,
        };
        info!(
            device = %device_info.name,
            backend = %device_info.backend,
            "GPU device selected"
        );

        Ok(Self {
            device,
            queue,
            device_info,
            timestamp_query_set,
            timestamp_period,
        })
    }

    fn run_add(&self, plan: GpuAddPlan, a: &[f32], b: &[f32]) -> Result<GpuExecutionResult> {
        // Zero-sized wgpu buffers are invalid. An empty workload is a no-op
        // with a genuine zero-length device span, not a profiling failure.
        if plan.problem.len == 0 {
            return Ok(GpuExecutionResult {
                output: Vec::new(),
                duration: StrategyDuration::DeviceTimed(0),
            });
        }

        let a_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("input_a"),
                contents: cast_slice(a),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let b_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("input_b"),
                contents: cast_slice(b),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let output_size = (plan.problem.len * std::mem::size_of::<f32>()) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let timestamp_buffer = self.timestamp_query_set.as_ref().map(|_| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("timestamp_buffer"),
                size: 2 * std::mem::size_of::<u64>() as u64,
                usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        });
        let timestamp_staging = self.timestamp_query_set.as_ref().map(|_| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("timestamp_staging"),
                size: 2 * std::mem::size_of::<u64>() as u64,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let params = ShaderParams {
            len: plan.problem.len as u32,
            division: plan.division,
            _pad0: 0,
            _pad1: 0,
        };
        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("params"),
                contents: cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("add_layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 3,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: NonZeroU64::new(
                                    std::mem::size_of::<ShaderParams>() as u64,
                                ),
                            },
                            count: None,
                        },
                    ],
                });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("add_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: a_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: b_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("add_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let shader_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("add_shader"),
                source: wgpu::ShaderSource::Wgsl(ADD_SHADER.into()),
            });

        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("add_pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader_module,
                entry_point: "main",
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("add_encoder"),
            });

        let timestamp_writes =
            self.timestamp_query_set
                .as_ref()
                .map(|qs| wgpu::ComputePassTimestampWrites {
                    query_set: qs,
                    beginning_of_pass_write_index: Some(0),
                    end_of_pass_write_index: Some(1),
                });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("add_pass"),
                timestamp_writes,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(plan.fan_out, 1, 1);
        }

        if let (Some(qs), Some(ts_buf)) = (&self.timestamp_query_set, &timestamp_buffer) {
            encoder.resolve_query_set(qs, 0..2, ts_buf, 0);
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        if let (Some(ts_buf), Some(ts_staging)) = (&timestamp_buffer, &timestamp_staging) {
            encoder.copy_buffer_to_buffer(
                ts_buf,
                0,
                ts_staging,
                0,
                2 * std::mem::size_of::<u64>() as u64,
            );
        }

        self.queue.submit(Some(encoder.finish()));
        // Drain before read: offloaded memory is not host-visible until the
        // device signals completion.
        self.device.poll(wgpu::Maintain::Wait);

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = sender.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| anyhow!("failed to receive GPU map signal"))??;
        let data = buffer_slice.get_mapped_range();
        let output: Vec<f32> = cast_slice(&data).to_vec();
        drop(data);
        staging_buffer.unmap();

        let duration = if let Some(ts_staging) = &timestamp_staging {
            let ts_slice = ts_staging.slice(..);
            let (ts_sender, ts_receiver) = mpsc::channel();
            ts_slice.map_async(wgpu::MapMode::Read, move |res| {
                let _ = ts_sender.send(res);
            });
            self.device.poll(wgpu::Maintain::Wait);

            match ts_receiver.recv() {
                Ok(Ok(())) => {
                    let ts_data = ts_slice.get_mapped_range();
                    let timestamps: &[u64] = cast_slice(&ts_data);
                    let (begin, end) = (timestamps[0], timestamps[1]);
                    drop(ts_data);
                    ts_staging.unmap();
                    StrategyDuration::device_span(begin, end, self.timestamp_period)
                }
                _ => {
                    warn!("timestamp readback failed; reporting duration as unavailable");
                    StrategyDuration::Unavailable
                }
            }
        } else {
            StrategyDuration::Unavailable
        };

        Ok(GpuExecutionResult { output, duration })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ShaderParams {
    len: u32,
    division: u32,
    _pad0: u32,
    _pad1: u32,
}

// One workgroup per work item, mirroring the fan-out the host strategies
// use: item i walks its own sub-range, clamped to the vector length.
const ADD_SHADER: &str = r#"
struct Params {
  len: u32,
  division: u32,
  _pad0: u32,
  _pad1: u32,
}

@group(0) @binding(0)
var<storage, read> input_a: array<f32>;

@group(0) @binding(1)
var<storage, read> input_b: array<f32>;

@group(0) @binding(2)
var<storage, read_write> output: array<f32>;

@group(0) @binding(3)
var<uniform> params: Params;

@compute @workgroup_size(1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
  let begin = gid.x * params.division;
  let end = min(begin + params.division, params.len);
  var j: u32 = begin;
  loop {
    if (j >= end) {
      break;
    }
    output[j] = input_a[j] + input_b[j];
    j = j + 1u;
  }
}
"#;

/// Accelerator-offloaded strategy backed by [`GpuExecutor`].
pub struct GpuAdd {
    executor: GpuExecutor,
}

impl GpuAdd {
    pub fn new() -> Result<Self> {
        Ok(Self {
            executor: GpuExecutor::new(GpuPlanner::new())?,
        })
    }

    pub fn device_info(&self) -> &GpuDeviceInfo {
        self.executor.device_info()
    }
}

impl AddStrategy for GpuAdd {
    fn name(&self) -> &'static str {
        "gpu-wgpu"
    }

    fn device_description(&self) -> Option<String> {
        let info = self.executor.device_info();
        Some(format!("{} ({})", info.name, info.backend))
    }

    fn execute(&self, a: &[f32], b: &[f32], workers: usize) -> Result<StrategyResult> {
        let result = self.executor.execute_add(a, b, workers)?;
        Ok(StrategyResult {
            output: result.output,
            duration: result.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn executor() -> Option<GpuExecutor> {
        match GpuExecutor::new(GpuPlanner::new()) {
            Ok(exec) => Some(exec),
            Err(err) => {
                eprintln!("skipping GPU test: {err}");
                None
            }
        }
    }

    #[test]
    fn offloaded_add_matches_host_sum() {
        let Some(exec) = executor() else { return };
        let a: Vec<f32> = (0..10).map(|i| i as f32 * 0.5).collect();
        let b: Vec<f32> = (0..10).map(|i| i as f32 * 0.25).collect();
        // 10 elements across 4 items exercises the clamped last sub-range.
        let result = exec.execute_add(&a, &b, 4).expect("gpu add");
        assert_eq!(result.output.len(), 10);
        for i in 0..10 {
            assert_abs_diff_eq!(result.output[i], a[i] + b[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn duration_comes_from_the_device_clock_or_is_unavailable() {
        let Some(exec) = executor() else { return };
        let a = vec![1.0f32; 64];
        let b = vec![2.0f32; 64];
        let result = exec.execute_add(&a, &b, 8).expect("gpu add");
        match result.duration {
            StrategyDuration::DeviceTimed(_) | StrategyDuration::Unavailable => {}
            StrategyDuration::HostTimed(_) => {
                panic!("offloaded strategy must not report host timing")
            }
        }
    }

    #[test]
    fn empty_workload_is_a_noop() {
        let Some(exec) = executor() else { return };
        let result = exec.execute_add(&[], &[], 3).expect("empty add");
        assert!(result.output.is_empty());
        assert_eq!(result.duration, StrategyDuration::DeviceTimed(0));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let Some(exec) = executor() else { return };
        assert!(exec.execute_add(&[1.0], &[1.0, 2.0], 1).is_err());
    }
}
