use divan::{black_box, Bencher};
use ndarray::Array2;
use sift_descriptor::{GradientPair, SiftDescriptor, SiftDescriptorConfig};

fn main() {
    divan::main();
}

fn synthetic_gradients(width: usize, height: usize) -> (Array2<f32>, Array2<f32>) {
    let deriv_x = Array2::from_shape_fn((height, width), |(y, x)| {
        (0.37 * (x as f32 + 2.0 * y as f32)).cos()
    });
    let deriv_y = Array2::from_shape_fn((height, width), |(y, x)| {
        (0.29 * (2.0 * x as f32 - y as f32)).sin()
    });
    (deriv_x, deriv_y)
}

#[divan::bench(sample_count = 1000)]
fn sift_descriptor(bencher: Bencher) {
    let sift = SiftDescriptor::new(SiftDescriptorConfig::default()).unwrap();
    let (dx, dy) = synthetic_gradients(512, 512);
    let gradients = GradientPair::new(&dx, &dy).unwrap();
    let mut desc = vec![0.0; sift.descriptor_length()];

    bencher.bench_local(|| {
        black_box(sift.process(gradients, 100.0, 100.0, 2.1, 1.23, black_box(&mut desc)))
    });
}

#[divan::bench(sample_count = 1000)]
fn sift_descriptor_large_sigma(bencher: Bencher) {
    let sift = SiftDescriptor::new(SiftDescriptorConfig::default()).unwrap();
    let (dx, dy) = synthetic_gradients(512, 512);
    let gradients = GradientPair::new(&dx, &dy).unwrap();
    let mut desc = vec![0.0; sift.descriptor_length()];

    bencher.bench_local(|| {
        black_box(sift.process(gradients, 256.0, 256.0, 8.0, 0.4, black_box(&mut desc)))
    });
}
