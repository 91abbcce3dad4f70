use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sqlpass::{format_string, Mode};

const SIMPLE_SELECT: &str = "select a, b, c from my_table where x = 1 and y = 2";

const WIDE_SELECT: &str = "select order_id, customer_id, order_date, ship_date, \
    status, subtotal, tax, shipping, total, coalesce(discount, 0) as discount, \
    row_number() over (partition by customer_id order by order_date) as order_seq \
    from raw.orders where order_date >= '2024-01-01'";

const NESTED_QUERY: &str = "with recent as (select id, total from orders where \
    created_at > dateadd('day', -30, current_date())), ranked as (select id, total, \
    row_number() over (order by total desc) as rk from recent) select r.id, \
    case when r.rk <= 10 then 'top' when r.rk <= 100 then 'mid' else 'tail' end \
    as bucket, c.name from ranked r left join customers c on r.id = c.order_id \
    where c.active = 1 order by r.rk limit 500";

const JINJA_MODEL: &str = "select o.order_id, o.total, c.segment \
    from {{ ref('stg_orders') }} o join {{ ref('dim_customers') }} c \
    on o.customer_id = c.customer_id \
    where o.order_date > '{{ var(\"start_date\") }}' -- incremental window\n";

fn bench_format(c: &mut Criterion) {
    let mode = Mode::default();

    c.bench_function("format_simple_select", |b| {
        b.iter(|| format_string(black_box(SIMPLE_SELECT), &mode).unwrap())
    });

    c.bench_function("format_wide_select", |b| {
        b.iter(|| format_string(black_box(WIDE_SELECT), &mode).unwrap())
    });

    c.bench_function("format_nested_query", |b| {
        b.iter(|| format_string(black_box(NESTED_QUERY), &mode).unwrap())
    });

    c.bench_function("format_jinja_model", |b| {
        b.iter(|| format_string(black_box(JINJA_MODEL), &mode).unwrap())
    });

    // many statements in one file, dominated by the semicolon reset path
    let batch = format!("{};\n", SIMPLE_SELECT).repeat(50);
    c.bench_function("format_statement_batch", |b| {
        b.iter(|| format_string(black_box(&batch), &mode).unwrap())
    });
}

fn bench_fast_mode(c: &mut Criterion) {
    let mode = Mode {
        fast: true,
        ..Mode::default()
    };

    c.bench_function("format_nested_query_fast", |b| {
        b.iter(|| format_string(black_box(NESTED_QUERY), &mode).unwrap())
    });
}

criterion_group!(benches, bench_format, bench_fast_mode);
criterion_main!(benches);
