//! End-to-end tests for one generation pass: seed a resolved module,
//! run the generator, and check the produced bindings, linkage names,
//! marshaling plans and layouts.

use rustc_hash::FxHashSet;
use solder::{Generator, ManagedType, MarshalPlan, PrimitiveKind};
use solder_bind::Family;
use solder_model::{
    ArrayPolicy, BufferPolicy, CPrimitive, CompoundType, FnDirectives, FunctionSymbol,
    GeneratorConfig, NativeArg, NativeModule, TypeInterner,
};
use solder_native::check_balance;

fn empty_config() -> GeneratorConfig {
    GeneratorConfig::new()
}

fn module() -> NativeModule {
    NativeModule::new("org.demo", "Natives")
}

#[test]
fn opaque_pointer_expands_to_nine_arrays_plus_buffer() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let vp = i.pointer_to(void.clone(), false);
    let mut m = module();
    m.add_function(FunctionSymbol::new("f", void, vec![NativeArg::new(vp, Some("p"))]));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    let variants = report.variants_of("f");
    assert_eq!(variants.len(), 10);
    let array_backed = variants
        .iter()
        .filter(|v| v.binding.args()[0].family() == Some(Family::Array))
        .count();
    assert_eq!(array_backed, 9);
    assert_eq!(
        variants
            .iter()
            .filter(|v| v.binding.args()[0] == ManagedType::Buffer)
            .count(),
        1
    );
}

#[test]
fn typed_pointer_with_array_only_policy_yields_one_variant() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let int = i.primitive(CPrimitive::Int32);
    let ip = i.pointer_to(int, false);
    let mut m = module();
    m.add_function(FunctionSymbol::new("g", void, vec![NativeArg::new(ip, Some("p"))]));

    let mut config = empty_config();
    config.set(
        "g",
        FnDirectives { buffer_policy: BufferPolicy::Suppressed, ..Default::default() },
    );
    let report = Generator::new(&m, &config).run(&mut i);

    let variants = report.variants_of("g");
    assert_eq!(variants.len(), 1);
    assert_eq!(
        variants[0].binding.args()[0],
        ManagedType::PrimitiveArray(PrimitiveKind::Int)
    );
    // One entry point means no overload suffix.
    assert_eq!(variants[0].linkage_name, "Java_org_demo_Natives_g");
}

#[test]
fn two_opaque_pointers_flatten_into_uniform_families() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let vp = i.pointer_to(void.clone(), false);
    let mut m = module();
    m.add_function(FunctionSymbol::new(
        "h",
        void,
        vec![NativeArg::new(vp.clone(), Some("a")), NativeArg::new(vp, Some("b"))],
    ));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    let variants = report.variants_of("h");
    // 9x9 array-family combinations plus the all-buffer variant.
    assert_eq!(variants.len(), 82);
    for v in &variants {
        let fa = v.binding.args()[0].family().unwrap();
        let fb = v.binding.args()[1].family().unwrap();
        assert_eq!(fa, fb);
    }
}

#[test]
fn overloaded_linkage_names_are_pairwise_distinct() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let vp = i.pointer_to(void.clone(), false);
    let mut m = module();
    m.add_function(FunctionSymbol::new(
        "h",
        void,
        vec![NativeArg::new(vp.clone(), Some("a")), NativeArg::new(vp, Some("b"))],
    ));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    let mut names = FxHashSet::default();
    for v in report.variants_of("h") {
        assert!(v.linkage_name.starts_with("Java_org_demo_Natives_h__"));
        assert!(names.insert(v.linkage_name.clone()), "colliding name {}", v.linkage_name);
    }
}

#[test]
fn every_generated_shim_is_acquire_release_balanced() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let ch = i.primitive(CPrimitive::Char8);
    let fl = i.primitive(CPrimitive::Float32);
    let vp = i.pointer_to(void.clone(), false);
    let cp = i.pointer_to(ch.clone(), true);
    let cpc = i.pointer_to(ch, true);
    let table = i.pointer_to(cpc, false);
    let fp = i.pointer_to(fl, false);

    let mut m = module();
    m.add_function(FunctionSymbol::new(
        "mixed",
        void,
        vec![
            NativeArg::new(vp, Some("data")),
            NativeArg::new(cp, Some("name")),
            NativeArg::new(table, Some("sources")),
            NativeArg::new(fp, Some("values")),
        ],
    ));

    let mut config = empty_config();
    let mut d = FnDirectives::default();
    d.text_args.insert(1);
    d.text_args.insert(2);
    config.set("mixed", d);

    let report = Generator::new(&m, &config).run(&mut i);
    let variants = report.variants_of("mixed");
    assert!(!variants.is_empty());
    for v in &variants {
        let shim = v.shim.as_ref().expect("shim plan expected");
        check_balance(shim).expect("unbalanced generated shim");
    }
}

#[test]
fn too_deep_nesting_skips_only_the_offending_symbol() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let int = i.primitive(CPrimitive::Int32);
    let p1 = i.pointer_to(int.clone(), false);
    let p2 = i.pointer_to(p1, false);
    let p3 = i.pointer_to(p2, false);

    let mut m = module();
    m.add_function(FunctionSymbol::new("bad", void.clone(), vec![NativeArg::new(p3, Some("p"))]));
    m.add_function(FunctionSymbol::new("good", void, vec![NativeArg::new(int, Some("n"))]));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    assert!(report.was_skipped("bad"));
    assert_eq!(report.variants_of("bad").len(), 0);
    assert_eq!(report.variants_of("good").len(), 1);
}

#[test]
fn suppressing_every_representation_leaves_the_symbol_unbound() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let vp = i.pointer_to(void.clone(), false);
    let mut m = module();
    m.add_function(FunctionSymbol::new("quiet", void, vec![NativeArg::new(vp, Some("p"))]));

    let mut config = empty_config();
    config.set(
        "quiet",
        FnDirectives {
            array_policy: ArrayPolicy::Suppressed,
            buffer_policy: BufferPolicy::Suppressed,
            ..Default::default()
        },
    );
    let report = Generator::new(&m, &config).run(&mut i);

    assert!(report.unbound.contains(&"quiet".to_string()));
    assert!(!report.was_skipped("quiet"));
}

#[test]
fn manual_body_keeps_the_binding_but_emits_no_shim() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let int = i.primitive(CPrimitive::Int32);
    let mut m = module();
    m.add_function(FunctionSymbol::new("custom", void, vec![NativeArg::new(int, Some("n"))]));

    let mut config = empty_config();
    config.set("custom", FnDirectives { manual_body: true, ..Default::default() });
    let report = Generator::new(&m, &config).run(&mut i);

    let variants = report.variants_of("custom");
    assert_eq!(variants.len(), 1);
    assert!(variants[0].shim.is_none());
    assert_eq!(variants[0].linkage_name, "Java_org_demo_Natives_custom");
}

#[test]
fn struct_function_pointer_gets_a_receiver_entry_point() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let int = i.primitive(CPrimitive::Int32);
    let long = i.primitive(CPrimitive::Int64);
    let device_ty = i.compound("Device", false, 16);
    let device_ptr = i.pointer_to(device_ty, false);
    let present_fn = i.function(void.clone(), vec![device_ptr, int.clone()]);
    let present_ptr = i.pointer_to(present_fn, false);

    let mut m = module();
    m.add_compound(CompoundType::new(
        "Device",
        false,
        vec![("handle".into(), long), ("present".into(), present_ptr)],
    ));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    let layout = report.layout_of("Device").expect("Device layout");
    assert_eq!(layout.offset_of("handle"), Some(0));
    assert_eq!(layout.offset_of("present"), Some(8));
    assert_eq!(layout.size, 16);

    let variants = report.variants_of("Device_present");
    assert_eq!(variants.len(), 1);
    let bound = variants[0];
    assert_eq!(bound.binding.receiver(), Some(0));
    assert_eq!(bound.linkage_name, "Java_org_demo_Device_present");
    let shim = bound.shim.as_ref().expect("shim plan");
    assert_eq!(shim.args[0].plan, MarshalPlan::ReceiverAddress);
    assert_eq!(shim.args[1].plan, MarshalPlan::PassThroughPrimitive);
}

#[test]
fn union_layout_reports_zero_offsets_and_max_size() {
    let mut i = TypeInterner::new();
    let int32 = i.primitive(CPrimitive::Int32);
    let int64 = i.primitive(CPrimitive::Int64);
    let mut m = module();
    m.add_compound(CompoundType::new(
        "Scalar",
        true,
        vec![("i".into(), int32), ("l".into(), int64)],
    ));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    let layout = report.layout_of("Scalar").expect("Scalar layout");
    assert_eq!(layout.offset_of("i"), Some(0));
    assert_eq!(layout.offset_of("l"), Some(0));
    assert_eq!(layout.size, 8);
}

#[test]
fn duplicate_declarations_bind_once() {
    let mut i = TypeInterner::new();
    let void = i.void();
    let int = i.primitive(CPrimitive::Int32);
    let mut m = module();
    m.add_function(FunctionSymbol::new(
        "twice",
        void.clone(),
        vec![NativeArg::new(int.clone(), Some("count"))],
    ));
    m.add_function(FunctionSymbol::new("twice", void, vec![NativeArg::new(int, Some("n"))]));

    let config = empty_config();
    let report = Generator::new(&m, &config).run(&mut i);

    assert_eq!(report.variants_of("twice").len(), 1);
}
