/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 层权重的初始化策略
 */

use rand::rngs::StdRng;

use crate::tensor::Tensor;

/// 参数初始化策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// 全一
    Ones,
    /// 正态分布（使用 Graph 的 RNG）
    Normal { mean: f32, std: f32 },
    /// Kaiming/He 初始化（适用于 `ReLU`）
    Kaiming,
    /// Xavier/Glorot 初始化（适用于 Sigmoid/Tanh）
    Xavier,
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    ///
    /// `fan_in`取除末维外所有维度之积（`Dense`的`[in, units]`即`in`，
    /// `Conv1d`的`[kernel_size, channels, filters]`即`kernel_size * channels`），`fan_out`取末维。
    pub fn generate_with_rng(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::ones(shape).map(|x| x * v),
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => Tensor::normal_with_rng(*mean, *std, shape, rng),
            Self::Kaiming => {
                let (fan_in, _) = fans(shape);
                let std = (2.0 / fan_in as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
            Self::Xavier => {
                let (fan_in, fan_out) = fans(shape);
                let std = (2.0 / (fan_in + fan_out) as f32).sqrt();
                Tensor::normal_with_rng(0.0, std, shape, rng)
            }
        }
    }
}

fn fans(shape: &[usize]) -> (usize, usize) {
    match shape.split_last() {
        Some((&last, [])) => (last.max(1), 1),
        Some((&last, rest)) => (rest.iter().product::<usize>().max(1), last.max(1)),
        None => (1, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_init_constant_and_zeros() {
        let mut rng = StdRng::seed_from_u64(0);
        let t = Init::Constant(0.5).generate_with_rng(&[2, 3], &mut rng);
        assert_eq!(t.shape(), &[2, 3]);
        assert!(t.to_vec().iter().all(|&x| x == 0.5));

        let z = Init::Zeros.generate_with_rng(&[4], &mut rng);
        assert!(z.to_vec().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_init_xavier_is_reproducible_with_same_seed() {
        let a = Init::Xavier.generate_with_rng(&[3, 2], &mut StdRng::seed_from_u64(42));
        let b = Init::Xavier.generate_with_rng(&[3, 2], &mut StdRng::seed_from_u64(42));
        let c = Init::Xavier.generate_with_rng(&[3, 2], &mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fans() {
        assert_eq!(fans(&[3, 2]), (3, 2));
        assert_eq!(fans(&[3, 4, 8]), (12, 8));
        assert_eq!(fans(&[5]), (5, 1));
    }
}
