/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel, odd.
/// * `sigma` - The sigma of the gaussian kernel. Non-positive values derive
///   it from the size as `0.3 * ((kernel_size - 1) / 2 - 1) + 0.8`.
///
/// # Returns
///
/// A normalized vector of the kernel. Sizes up to 7 with a derived sigma
/// use the usual binomial tables.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        match kernel_size {
            1 => return vec![1.0],
            3 => return vec![0.25, 0.5, 0.25],
            5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => {
                return vec![
                    0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
                ]
            }
            _ => {}
        }
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    };

    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / (2.0 * sigma_sq)).exp()
        })
        .collect();

    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kernels_are_normalized_and_symmetric() {
        for size in [1, 3, 5, 7, 9, 15] {
            let kernel = gaussian_kernel_1d(size, 0.0);
            assert_eq!(kernel.len(), size);
            assert_relative_eq!(kernel.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
            for i in 0..size / 2 {
                assert_relative_eq!(kernel[i], kernel[size - 1 - i], epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn peak_in_the_middle() {
        let kernel = gaussian_kernel_1d(15, 0.0);
        let peak = kernel.iter().cloned().fold(0.0f32, f32::max);
        assert_eq!(peak, kernel[7]);
        assert!(kernel[0] > 0.0);
    }

    #[test]
    fn explicit_sigma() {
        let kernel = gaussian_kernel_1d(5, 1.0);
        assert_relative_eq!(kernel[2], 0.40262, epsilon = 1e-4);
    }
}
