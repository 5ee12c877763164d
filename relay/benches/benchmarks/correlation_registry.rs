use std::sync::Arc;
use std::time::Duration;

use criterion::{BatchSize, Criterion, criterion_group};

use relay::clock::clock::SystemClock;
use relay::net::correlation::correlation_token::CorrelationToken;
use relay::net::correlation_registry::correlation_registry::CorrelationRegistry;
use relay::net::correlation_registry::correlation_registry_config::CorrelationRegistryConfig;

const SIZE: usize = 64 * 1024;

fn register(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("correlation registry register");

    group.bench_function("register without capacity", |bencher| {
        bencher.iter_batched(
            || {
                let registry = CorrelationRegistry::<u64>::new_with_disabled_expired_waiters_removal(Arc::new(SystemClock::new()));
                let tokens = (0..SIZE).map(|index| CorrelationToken::from(index.to_string())).collect::<Vec<_>>();
                (registry, tokens)
            },
            |(registry, tokens)| {
                for token in tokens {
                    let _ = registry.register_with_deadline(token, Duration::from_secs(5));
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("register with capacity", |bencher| {
        bencher.iter_batched(
            || {
                let registry = CorrelationRegistry::<u64>::new_with_capacity_and_disabled_expired_waiters_removal(
                    SIZE,
                    Arc::new(SystemClock::new()),
                );
                let tokens = (0..SIZE).map(|index| CorrelationToken::from(index.to_string())).collect::<Vec<_>>();
                (registry, tokens)
            },
            |(registry, tokens)| {
                for token in tokens {
                    let _ = registry.register_with_deadline(token, Duration::from_secs(5));
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn register_and_resolve(criterion: &mut Criterion) {
    criterion.bench_function("correlation registry register and resolve with expired waiters removal", |bencher| {
        let registry = CorrelationRegistry::<u64>::new_with_capacity(
            SIZE,
            Arc::new(SystemClock::new()),
            CorrelationRegistryConfig::new(Duration::from_millis(500)),
        );

        bencher.iter_batched(
            || (0..SIZE).map(|index| CorrelationToken::from(index.to_string())).collect::<Vec<_>>(),
            |tokens| {
                for token in tokens {
                    let _response = registry.register_with_deadline(token.clone(), Duration::from_secs(5));
                    registry.resolve(&token, 1);
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, register, register_and_resolve);
