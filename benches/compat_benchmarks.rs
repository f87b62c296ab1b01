use capi_compat::host::{self, Runtime};
use capi_compat::{RuntimeVersion, compat, gate};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_new_ref(c: &mut Criterion) {
    let _rt = Runtime::initialize();
    let code = host::code_new("f", "<bench>", 1);

    c.bench_function("new_ref + decref", |b| {
        b.iter(|| unsafe {
            let strong = compat::new_ref(black_box(code));
            host::decref(strong);
        })
    });

    unsafe { host::decref(code) };
}

fn bench_frame_traversal(c: &mut Criterion) {
    let rt = Runtime::initialize();
    let tstate = rt.main_thread();
    let code = host::code_new("main", "<bench>", 1);
    let (outer, inner) = unsafe {
        let outer = host::frame_new(tstate, code);
        host::thread_state_enter_frame(tstate, outer);
        let inner = host::frame_new(tstate, code);
        host::thread_state_enter_frame(tstate, inner);
        (outer, inner)
    };

    c.bench_function("frame_get_back_borrow", |b| {
        b.iter(|| unsafe { compat::frame_get_back_borrow(black_box(inner)) })
    });

    c.bench_function("thread_state_get_frame_borrow", |b| {
        b.iter(|| unsafe { compat::thread_state_get_frame_borrow(black_box(tstate)) })
    });

    unsafe {
        host::thread_state_leave_frame(tstate);
        host::thread_state_leave_frame(tstate);
        host::decref(inner);
        host::decref(outer);
        host::decref(code);
    }
}

fn bench_call(c: &mut Criterion) {
    let _rt = Runtime::initialize();
    let identity = host::function_new("identity", |args| {
        unsafe { host::incref(args[0]) };
        args[0]
    });
    let code = host::code_new("f", "<bench>", 1);

    c.bench_function("call_one_arg", |b| {
        b.iter(|| unsafe {
            let result = compat::call_one_arg(black_box(identity), code);
            host::decref(result);
        })
    });

    unsafe {
        host::decref(code);
        host::decref(identity);
    }
}

fn bench_module_add_type(c: &mut Criterion) {
    let _rt = Runtime::initialize();

    c.bench_function("module_add_type", |b| {
        b.iter(|| unsafe {
            let module = host::module_new("pkg");
            let ty = host::type_new("pkg.sub.MyType", 0);
            black_box(compat::module_add_type(module, ty));
            host::decref(module);
            host::decref(ty);
        })
    });
}

fn bench_gate(c: &mut Criterion) {
    let target = RuntimeVersion::alpha(3, 9, 5);

    c.bench_function("catalogue", |b| {
        b.iter(|| gate::catalogue(black_box(target)))
    });

    c.bench_function("parse version", |b| {
        b.iter(|| RuntimeVersion::parse(black_box("3.9.0rc2")))
    });
}

criterion_group!(
    benches,
    bench_new_ref,
    bench_frame_traversal,
    bench_call,
    bench_module_add_type,
    bench_gate
);
criterion_main!(benches);
