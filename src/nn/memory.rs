/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 参数张量的资源计数：每个被跟踪的张量在分配时登记、在释放时注销
 */

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::Serialize;

use crate::tensor::Tensor;

/// 当前存活（已登记且未释放）的张量数量与字节数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryInfo {
    pub num_tensors: usize,
    pub num_bytes: usize,
}

/// 资源计数器
///
/// 克隆得到的是同一个计数器的另一个句柄（单线程，`Rc<Cell<_>>`）。
#[derive(Clone, Default)]
pub struct MemoryTracker {
    state: Rc<Cell<MemoryInfo>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前计数快照
    pub fn memory(&self) -> MemoryInfo {
        self.state.get()
    }

    /// 把一个张量交给计数器跟踪
    pub fn track(&self, tensor: Tensor) -> TrackedTensor {
        self.register(&tensor);
        TrackedTensor {
            value: tensor,
            tracker: self.clone(),
        }
    }

    fn register(&self, tensor: &Tensor) {
        let mut info = self.state.get();
        info.num_tensors += 1;
        info.num_bytes += tensor.nbytes();
        self.state.set(info);
    }

    fn release(&self, tensor: &Tensor) {
        let mut info = self.state.get();
        info.num_tensors = info.num_tensors.saturating_sub(1);
        info.num_bytes = info.num_bytes.saturating_sub(tensor.nbytes());
        self.state.set(info);
    }

    /// 两个句柄是否指向同一个计数器
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for MemoryTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTracker")
            .field("memory", &self.memory())
            .finish()
    }
}

/// 被计数器跟踪的张量
///
/// 克隆即真正复制一份数据并重新登记；`Drop`时注销。
pub struct TrackedTensor {
    value: Tensor,
    tracker: MemoryTracker,
}

impl TrackedTensor {
    pub const fn value(&self) -> &Tensor {
        &self.value
    }

    /// 用新值覆盖（形状必须一致，故字节数不变，计数无需调整）
    pub(crate) fn assign(&mut self, value: Tensor) -> Result<(), Tensor> {
        if value.shape() != self.value.shape() {
            return Err(value);
        }
        self.value = value;
        Ok(())
    }
}

impl Deref for TrackedTensor {
    type Target = Tensor;

    fn deref(&self) -> &Tensor {
        &self.value
    }
}

impl Clone for TrackedTensor {
    fn clone(&self) -> Self {
        self.tracker.track(self.value.clone())
    }
}

impl Drop for TrackedTensor {
    fn drop(&mut self) {
        self.tracker.release(&self.value);
    }
}

impl fmt::Debug for TrackedTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedTensor").field(&self.value).finish()
    }
}
