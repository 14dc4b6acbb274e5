use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use domainadapt::adapter::{AdaptationMethod, DomainAdapter};
use domainadapt::estimators::{estimators::Ridge, traits::Fit};
use domainadapt::helpers::test_helpers::generate_covariate_shift_regression;

fn bench_adaptation(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptation");
    group.sample_size(10);

    for n_samples in [50, 200] {
        let (dataset, _, _) = generate_covariate_shift_regression(n_samples, n_samples, 0);

        let methods = [
            ("gaussian density", AdaptationMethod::gaussian_density()),
            ("kernel mean matching", AdaptationMethod::kernel_mean_matching(1.)),
            ("exact transport", AdaptationMethod::exact_transport()),
            ("entropic transport", AdaptationMethod::entropic_transport(1.)),
            ("coral", AdaptationMethod::coral()),
            ("transfer component analysis", AdaptationMethod::transfer_component_analysis(2)),
        ];
        for (name, method) in methods {
            let params = DomainAdapter::params(Ridge::params()).method(method);

            group.bench_with_input(BenchmarkId::new(name, n_samples), &n_samples, |b, _| {
                b.iter(|| params.fit(&dataset).unwrap())
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_adaptation);
criterion_main!(benches);
