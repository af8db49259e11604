use std::{marker::PhantomData, sync::Arc, vec::Vec};

use crate::{
    dtypes::FloatDtype,
    shapes::Shape,
    tensor::{Cpu, Error, Tensor},
};

use super::{AveragePoolPadMode, PoolForwardBackward, PoolGeometry, PoolSolverFactory};

/// Calls `f` with every multi-index of `dims` in row-major order.
fn for_each_nd_index<F: FnMut(&[usize])>(dims: &[usize], mut f: F) {
    if dims.contains(&0) {
        return;
    }
    let mut idx = vec![0; dims.len()];
    loop {
        f(&idx);
        let mut axis = dims.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            idx[axis] += 1;
            if idx[axis] < dims[axis] {
                break;
            }
            idx[axis] = 0;
        }
    }
}

/// For each output position of one (batch, channel) plane, the in-plane
/// offsets of the input positions its window covers. Padding is left out,
/// and offsets are listed in row-major kernel order.
#[derive(Debug, Clone)]
struct WindowTable {
    windows: Vec<Vec<usize>>,
    kernel_volume: usize,
}

impl WindowTable {
    fn build(geometry: &PoolGeometry, in_spatial: &[usize], out_spatial: &[usize]) -> Self {
        let in_strides = Shape::from(in_spatial).strides();
        let mut windows = Vec::with_capacity(out_spatial.iter().product());
        for_each_nd_index(out_spatial, |o| {
            let mut window = Vec::new();
            for_each_nd_index(&geometry.kernel_shape, |k| {
                let mut offset = 0;
                for axis in 0..k.len() {
                    let pos = (o[axis] * geometry.strides[axis] + k[axis])
                        .checked_sub(geometry.pads[axis]);
                    match pos {
                        Some(pos) if pos < in_spatial[axis] => offset += pos * in_strides[axis],
                        _ => return,
                    }
                }
                window.push(offset);
            });
            windows.push(window);
        });
        Self {
            windows,
            kernel_volume: geometry.kernel_shape.iter().product(),
        }
    }
}

#[derive(Debug, Clone)]
struct MaxPoolState {
    x_shape: Shape,
    y_shape: Shape,
    argmax: Vec<Option<usize>>,
}

/// Host max pooling solver.
///
/// Forward remembers, for every output element, the flat input index of the
/// first maximum of its window. A window with no in-bounds element yields
/// `-inf` and routes no gradient.
#[derive(Debug, Clone)]
pub struct CpuMaxPool<E> {
    dev: Cpu,
    geometry: PoolGeometry,
    state: Option<MaxPoolState>,
    marker: PhantomData<fn() -> E>,
}

impl<E: FloatDtype> PoolForwardBackward<E, Cpu> for CpuMaxPool<E> {
    fn forward(&mut self, x: &Tensor<E, Cpu>) -> Result<Tensor<E, Cpu>, Error> {
        let y_shape = self.geometry.try_output_shape("max_pool", x.shape())?;
        let table = WindowTable::build(
            &self.geometry,
            x.shape().spatial_dims(),
            y_shape.spatial_dims(),
        );
        let planes = x.shape()[0] * x.shape()[1];
        let in_volume: usize = x.shape().spatial_dims().iter().product();

        let inp = x.data.as_ref();
        let mut out = self.dev.try_alloc_elem(y_shape.num_elements(), E::neg_infinity())?;
        let mut argmax = vec![None; out.len()];
        let mut i_out = 0;
        for plane in 0..planes {
            let base = plane * in_volume;
            for window in table.windows.iter() {
                for &offset in window.iter() {
                    let v = inp[base + offset];
                    if argmax[i_out].is_none() || v > out[i_out] {
                        out[i_out] = v;
                        argmax[i_out] = Some(base + offset);
                    }
                }
                i_out += 1;
            }
        }

        self.state = Some(MaxPoolState {
            x_shape: x.shape().clone(),
            y_shape: y_shape.clone(),
            argmax,
        });
        Ok(Tensor {
            data: Arc::new(out),
            shape: y_shape,
            device: self.dev.clone(),
        })
    }

    fn backward(&mut self, gy: &Tensor<E, Cpu>) -> Result<Tensor<E, Cpu>, Error> {
        let state = self.state.as_ref().ok_or(Error::BackwardBeforeForward)?;
        if gy.shape() != &state.y_shape {
            return Err(Error::ShapeMismatch {
                op: "max_pool_grad",
                expected: state.y_shape.clone(),
                found: gy.shape().clone(),
            });
        }
        let grad_out = gy.data.as_ref();
        let mut grad_inp = self
            .dev
            .try_alloc_elem(state.x_shape.num_elements(), E::zero())?;
        for (i_out, target) in state.argmax.iter().enumerate() {
            if let Some(i_inp) = target {
                grad_inp[*i_inp] += grad_out[i_out];
            }
        }
        Ok(Tensor {
            data: Arc::new(grad_inp),
            shape: state.x_shape.clone(),
            device: self.dev.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct AveragePoolState<E> {
    x_shape: Shape,
    y_shape: Shape,
    table: WindowTable,
    divisors: Vec<E>,
}

/// Host average pooling solver.
#[derive(Debug, Clone)]
pub struct CpuAveragePool<E> {
    dev: Cpu,
    geometry: PoolGeometry,
    pad_mode: AveragePoolPadMode,
    state: Option<AveragePoolState<E>>,
}

impl<E: FloatDtype> CpuAveragePool<E> {
    fn divisor(&self, table: &WindowTable, window: &[usize]) -> E {
        let count = match self.pad_mode {
            AveragePoolPadMode::Zero => table.kernel_volume,
            AveragePoolPadMode::Ignore => window.len(),
        };
        E::cast_from_f64(count as f64)
    }
}

impl<E: FloatDtype> PoolForwardBackward<E, Cpu> for CpuAveragePool<E> {
    fn forward(&mut self, x: &Tensor<E, Cpu>) -> Result<Tensor<E, Cpu>, Error> {
        let y_shape = self.geometry.try_output_shape("average_pool", x.shape())?;
        let table = WindowTable::build(
            &self.geometry,
            x.shape().spatial_dims(),
            y_shape.spatial_dims(),
        );
        let divisors: Vec<E> = table
            .windows
            .iter()
            .map(|w| self.divisor(&table, w))
            .collect();
        let planes = x.shape()[0] * x.shape()[1];
        let in_volume: usize = x.shape().spatial_dims().iter().product();

        let inp = x.data.as_ref();
        let mut out = self.dev.try_alloc_elem(y_shape.num_elements(), E::zero())?;
        let mut i_out = 0;
        for plane in 0..planes {
            let base = plane * in_volume;
            for (window, &div) in table.windows.iter().zip(divisors.iter()) {
                if !window.is_empty() {
                    let mut tmp = E::zero();
                    for &offset in window.iter() {
                        tmp += inp[base + offset];
                    }
                    out[i_out] = tmp / div;
                }
                i_out += 1;
            }
        }

        self.state = Some(AveragePoolState {
            x_shape: x.shape().clone(),
            y_shape: y_shape.clone(),
            table,
            divisors,
        });
        Ok(Tensor {
            data: Arc::new(out),
            shape: y_shape,
            device: self.dev.clone(),
        })
    }

    fn backward(&mut self, gy: &Tensor<E, Cpu>) -> Result<Tensor<E, Cpu>, Error> {
        let state = self.state.as_ref().ok_or(Error::BackwardBeforeForward)?;
        if gy.shape() != &state.y_shape {
            return Err(Error::ShapeMismatch {
                op: "average_pool_grad",
                expected: state.y_shape.clone(),
                found: gy.shape().clone(),
            });
        }
        let planes = state.x_shape[0] * state.x_shape[1];
        let in_volume: usize = state.x_shape.spatial_dims().iter().product();

        let grad_out = gy.data.as_ref();
        let mut grad_inp = self
            .dev
            .try_alloc_elem(state.x_shape.num_elements(), E::zero())?;
        let mut i_out = 0;
        for plane in 0..planes {
            let base = plane * in_volume;
            for (window, &div) in state.table.windows.iter().zip(state.divisors.iter()) {
                if !window.is_empty() {
                    let g = grad_out[i_out] / div;
                    for &offset in window.iter() {
                        grad_inp[base + offset] += g;
                    }
                }
                i_out += 1;
            }
        }
        Ok(Tensor {
            data: Arc::new(grad_inp),
            shape: state.x_shape.clone(),
            device: self.dev.clone(),
        })
    }
}

impl<E: FloatDtype> PoolSolverFactory<E> for Cpu {
    type MaxPool = CpuMaxPool<E>;
    type AveragePool = CpuAveragePool<E>;

    fn try_max_pool_solver(&self, geometry: PoolGeometry) -> Result<Self::MaxPool, Error> {
        log::debug!(
            "max pool solver: kernel_shape={:?} strides={:?} pads={:?} cover_all={}",
            geometry.kernel_shape,
            geometry.strides,
            geometry.pads,
            geometry.cover_all
        );
        Ok(CpuMaxPool {
            dev: self.clone(),
            geometry,
            state: None,
            marker: PhantomData,
        })
    }

    fn try_average_pool_solver(
        &self,
        geometry: PoolGeometry,
        pad_mode: AveragePoolPadMode,
    ) -> Result<Self::AveragePool, Error> {
        if geometry.cover_all {
            return Err(Error::InvalidConfig {
                op: "average_pool",
                reason: "average pooling does not support cover_all",
            });
        }
        log::debug!(
            "average pool solver: kernel_shape={:?} strides={:?} pads={:?} pad_mode={:?}",
            geometry.kernel_shape,
            geometry.strides,
            geometry.pads,
            pad_mode
        );
        Ok(CpuAveragePool {
            dev: self.clone(),
            geometry,
            pad_mode,
            state: None,
        })
    }
}
