//! End-to-end scenarios, each driving only the public crate surface:
//! `PatchingOrchestrator` over a hand-built `IrContext`, then (where the
//! scenario calls for it) `BoundedAnyPathFinder`/`TraversalDriver` over the
//! patched call graph.

use icc_core::diagnostics::{CollectingDiagnosticSink, DiagnosticKind};
use icc_core::external::InMemoryManifestAnalysis;
use icc_core::icc::{Channel, ICCCalleeInfo, ICCCallerInfo};
use icc_core::ir::{Body, Class, ClassId, EdgeKind, InvokeKind, IrContext, Local, MethodId, Origin, Statement, TypeRef, Value};
use icc_core::patching::{bridge_name, patch_container_class, PatcherKind, PatchingOrchestrator};
use icc_core::traversal::{BoundedAnyPathFinder, CallPath, Plugin, TraversalDriver};
use icc_core::{ComponentSummaryTable, TraversalBounds};

fn caller() -> MethodId {
    MethodId::new(ClassId::new("com.example.Caller"), "onClick", vec![], TypeRef::new("void"))
}

/// spec E1: explicit service dispatch with an action and an extra resolves
/// to exactly one bridge and one recorded `IntentCaller`.
#[test]
fn e1_explicit_service_dispatch() {
    let mut ctx = IrContext::new();
    ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller()]));
    ctx.add_class(Class::new(ClassId::new("com.example.TestService"), Origin::Application));

    let i = Local::new("i");
    let intent_ty = TypeRef::new("android.content.Intent");
    let stmts = vec![
        Statement::Assign(i.clone(), Value::NewExpr(intent_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
            base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
            args: vec![Value::StringConstant("com.example".into()), Value::StringConstant("TestService".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.Intent"), "setAction", vec![TypeRef::new("String")], intent_ty.clone()),
            base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
            args: vec![Value::StringConstant("ACTION_TEST_1".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.Intent"), "putExtra", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
            base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
            args: vec![Value::StringConstant("auth_level".into()), Value::StringConstant("user".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("com.example.Caller"), "startService", vec![intent_ty.clone()], TypeRef::new("android.content.ComponentName")),
            base: None,
            args: vec![Value::Local(i.clone(), intent_ty)],
        }),
    ];
    ctx.add_body(Body::new(caller(), stmts));

    let orchestrator = PatchingOrchestrator::with_default_patchers();
    let manifest = InMemoryManifestAnalysis::new();
    let sink = CollectingDiagnosticSink::new();
    let mut summary = ComponentSummaryTable::new();
    let result = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();

    assert_eq!(result.statements_patched, 1);
    assert_eq!(result.bridges_created, 1);
    assert_eq!(sink.diagnostics().len(), 0);

    let service = ClassId::new("com.example.TestService");
    let bridge = bridge_name(&service, PatcherKind::Service);
    assert!(ctx.lookup_class(&patch_container_class()).unwrap().methods.iter().any(|m| m.name.as_ref() == bridge));

    let callers = summary.callers_of(&ClassId::new("com.example.Caller"), Channel::Icc);
    assert_eq!(callers.len(), 1);
    match &callers[0] {
        ICCCallerInfo::IntentCaller { intent_content, .. } => {
            assert!(intent_content.component_names.contains(&service));
            assert!(intent_content.actions.contains("ACTION_TEST_1"));
        }
        _ => panic!("expected IntentCaller"),
    }
}

/// spec E2: a broadcast with no staticly-resolvable target falls back to
/// every manifest-declared receiver, one bridge per receiver, and a
/// `ResolutionIncomplete` diagnostic.
#[test]
fn e2_unresolved_broadcast_falls_back_to_every_declared_receiver() {
    let mut ctx = IrContext::new();
    ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller()]));

    let i = Local::new("i");
    let intent_ty = TypeRef::new("android.content.Intent");
    let stmts = vec![
        Statement::Identity(i.clone(), Value::ParameterRef { index: 1, ty: intent_ty.clone() }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("com.example.Caller"), "sendBroadcast", vec![intent_ty.clone()], TypeRef::new("void")),
            base: None,
            args: vec![Value::Local(i.clone(), intent_ty)],
        }),
    ];
    ctx.add_body(Body::new(caller(), stmts));

    let orchestrator = PatchingOrchestrator::with_default_patchers();
    let manifest = InMemoryManifestAnalysis::new()
        .with_receiver(ClassId::new("com.example.ReceiverOne"))
        .with_receiver(ClassId::new("com.example.ReceiverTwo"));
    let sink = CollectingDiagnosticSink::new();
    let mut summary = ComponentSummaryTable::new();
    let result = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();

    assert_eq!(result.bridges_created, 2);
    assert_eq!(sink.count_of(DiagnosticKind::ResolutionIncomplete), 1);

    let callers = summary.callers_of(&ClassId::new("com.example.Caller"), Channel::Icc);
    assert_eq!(callers.len(), 1);
}

/// spec E3: a dynamically-registered receiver whose runtime class is
/// recoverable is recorded as an exported `IntentCallee` with its filter.
#[test]
fn e3_dynamic_receiver_registration() {
    let mut ctx = IrContext::new();
    ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller()]));

    let r = Local::new("r");
    let f = Local::new("f");
    let receiver_ty = TypeRef::new("com.example.MyReceiver");
    let filter_ty = TypeRef::new("android.content.IntentFilter");
    let stmts = vec![
        Statement::Assign(r.clone(), Value::NewExpr(receiver_ty.clone())),
        Statement::Assign(f.clone(), Value::NewExpr(filter_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.IntentFilter"), "addAction", vec![TypeRef::new("String")], filter_ty.clone()),
            base: Some(Box::new(Value::Local(f.clone(), filter_ty.clone()))),
            args: vec![Value::StringConstant("ACTION_DYNAMIC_1".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("com.example.Caller"), "registerReceiver", vec![TypeRef::new("android.content.BroadcastReceiver"), filter_ty.clone()], TypeRef::new("android.content.Intent")),
            base: None,
            args: vec![Value::Local(r.clone(), receiver_ty), Value::Local(f.clone(), filter_ty)],
        }),
    ];
    ctx.add_body(Body::new(caller(), stmts));

    let orchestrator = PatchingOrchestrator::with_default_patchers();
    let manifest = InMemoryManifestAnalysis::new();
    let sink = CollectingDiagnosticSink::new();
    let mut summary = ComponentSummaryTable::new();
    orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();

    let receiver = ClassId::new("com.example.MyReceiver");
    let callees = summary.callees_of(&receiver, Channel::Icc);
    assert_eq!(callees.len(), 1);
    match &callees[0] {
        ICCCalleeInfo::IntentCallee { exported, filters, .. } => {
            assert!(*exported);
            assert!(filters[0].actions.contains("ACTION_DYNAMIC_1"));
        }
        _ => panic!("expected IntentCallee"),
    }
}

/// spec E4: a 60-deep linear call chain under a depth-50 bound never
/// yields a path longer than 50 edges, and emits exactly one
/// `BoundExceeded` diagnostic for the entry point.
#[test]
fn e4_traversal_respects_depth_bound() {
    let mut ctx = IrContext::new();
    let names: Vec<String> = (0..60).map(|i| format!("m{i}")).collect();
    let methods: Vec<MethodId> = names.iter().map(|n| MethodId::new(ClassId::new("com.example.Chain"), n.as_str(), vec![], TypeRef::new("void"))).collect();
    ctx.add_class(Class::new(ClassId::new("com.example.Chain"), Origin::Application).with_methods(methods.clone()));

    for i in 0..methods.len() - 1 {
        let stmt = icc_core::ir::StmtId::new(methods[i].clone(), 0);
        ctx.add_body(Body::new(
            methods[i].clone(),
            vec![Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Static,
                method: methods[i + 1].clone(),
                base: None,
                args: vec![],
            })],
        ));
        ctx.call_graph.add_edge(&methods[i], &methods[i + 1], Some(stmt), EdgeKind::Static);
    }
    ctx.add_body(Body::new(methods[methods.len() - 1].clone(), vec![Statement::Return(None)]));

    let entry = ctx.call_graph.edges_out_of(&methods[0])[0].clone();
    let sink = CollectingDiagnosticSink::new();
    let bounds = TraversalBounds::default();
    let mut finder = BoundedAnyPathFinder::new(&ctx, bounds, &sink, vec![entry]);

    struct AcceptAll;
    impl icc_core::EdgePredicate for AcceptAll {
        fn want(&mut self, _edge: &icc_core::ir::EdgeRef) -> bool {
            true
        }
    }
    let mut predicate = AcceptAll;

    let mut max_len = 0;
    while let Some(path) = finder.next(&mut predicate) {
        max_len = max_len.max(path.len());
    }
    assert!(max_len <= 50);
    assert_eq!(sink.count_of(DiagnosticKind::BoundExceeded), 1);
}

/// spec E5: a multi-hop ICC chain (service dispatch, whose own body sends a
/// broadcast reaching a receiver) is walkable end to end and yields exactly
/// one accepted path when a plugin targets the final receiver's entry
/// point.
#[test]
fn e5_multi_hop_service_then_broadcast_reaches_receiver() {
    let mut ctx = IrContext::new();
    ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller()]));

    let service = ClassId::new("com.example.TestService");
    let on_start_command = MethodId::new(service.clone(), "onStartCommand", vec![TypeRef::new("android.content.Intent"), TypeRef::new("int"), TypeRef::new("int")], TypeRef::new("int"));
    ctx.add_class(Class::new(service.clone(), Origin::Application).with_methods(vec![on_start_command.clone()]));

    let receiver = ClassId::new("com.example.TestReceiver");
    let on_receive = MethodId::new(receiver.clone(), "onReceive", vec![TypeRef::new("android.content.Context"), TypeRef::new("android.content.Intent")], TypeRef::new("void"));
    ctx.add_class(Class::new(receiver.clone(), Origin::Application).with_methods(vec![on_receive.clone()]));
    ctx.add_body(Body::new(on_receive.clone(), vec![Statement::Return(None)]));

    // Caller.onClick: startService(intent -> TestService)
    let i = Local::new("i");
    let intent_ty = TypeRef::new("android.content.Intent");
    let caller_stmts = vec![
        Statement::Assign(i.clone(), Value::NewExpr(intent_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
            base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
            args: vec![Value::StringConstant("com.example".into()), Value::StringConstant("TestService".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("com.example.Caller"), "startService", vec![intent_ty.clone()], TypeRef::new("android.content.ComponentName")),
            base: None,
            args: vec![Value::Local(i.clone(), intent_ty.clone())],
        }),
    ];
    ctx.add_body(Body::new(caller(), caller_stmts));

    // TestService.onStartCommand: sendBroadcast(intent -> TestReceiver)
    let i2 = Local::new("i2");
    let service_stmts = vec![
        Statement::Assign(i2.clone(), Value::NewExpr(intent_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
            base: Some(Box::new(Value::Local(i2.clone(), intent_ty.clone()))),
            args: vec![Value::StringConstant("com.example".into()), Value::StringConstant("TestReceiver".into())],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(service.clone(), "sendBroadcast", vec![intent_ty.clone()], TypeRef::new("void")),
            base: None,
            args: vec![Value::Local(i2.clone(), intent_ty)],
        }),
        Statement::Return(Some(Value::IntConstant(0))),
    ];
    ctx.add_body(Body::new(on_start_command.clone(), service_stmts));

    let orchestrator = PatchingOrchestrator::with_default_patchers();
    let manifest = InMemoryManifestAnalysis::new();
    let sink = CollectingDiagnosticSink::new();
    let mut summary = ComponentSummaryTable::new();
    let result = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();
    assert_eq!(result.bridges_created, 2);

    let service_bridge = MethodId::new(patch_container_class(), bridge_name(&service, PatcherKind::Service), vec![], TypeRef::new("void"));
    let receiver_bridge = MethodId::new(patch_container_class(), bridge_name(&receiver, PatcherKind::BroadcastReceiver), vec![], TypeRef::new("void"));

    // Ordinary dispatch edges a prior call-graph-construction phase would
    // have produced from each bridge's own invoke statement into its target
    // entry point; building the call graph from bytecode is out of scope
    // here, so the test supplies them directly.
    let service_bridge_body = ctx.body_of(&service_bridge).unwrap().clone();
    let service_invoke_stmt = service_bridge_body.stmt_id(2);
    ctx.call_graph.add_edge(&service_bridge, &on_start_command, Some(service_invoke_stmt), EdgeKind::Virtual);

    let receiver_bridge_body = ctx.body_of(&receiver_bridge).unwrap().clone();
    let receiver_invoke_stmt = receiver_bridge_body.stmt_id(2);
    ctx.call_graph.add_edge(&receiver_bridge, &on_receive, Some(receiver_invoke_stmt), EdgeKind::Virtual);

    struct ReachesReceiver {
        needle: MethodId,
        hits: std::rc::Rc<std::cell::RefCell<Vec<CallPath>>>,
    }
    impl Plugin for ReachesReceiver {
        fn process_unit(&mut self, method: &MethodId, _stmt: &icc_core::ir::StmtId) -> bool {
            method == &self.needle
        }
        fn on_target_path(&mut self, path: CallPath) {
            self.hits.borrow_mut().push(path);
        }
    }

    let entry = ctx.call_graph.edges_out_of(&caller())[0].clone();
    let bounds = TraversalBounds::default();
    let traversal_sink = CollectingDiagnosticSink::new();
    let mut finder = BoundedAnyPathFinder::new(&ctx, bounds, &traversal_sink, vec![entry]);

    let hits = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let plugin = ReachesReceiver { needle: on_receive.clone(), hits: hits.clone() };
    let mut driver = TraversalDriver::new(&ctx, vec![Box::new(plugin)]);
    driver.run(&mut finder);

    let recorded = hits.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].path.len(), 4);
    assert_eq!(recorded[0].path.last().unwrap().tgt, on_receive);
}

/// spec E6: messenger dispatch tags the synthesized bridge by the
/// recovered `what` constant.
#[test]
fn e6_messenger_dispatch_tags_bridge_by_what() {
    let mut ctx = IrContext::new();
    ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller()]));

    let h = Local::new("h");
    let msgr = Local::new("msgr");
    let msg = Local::new("msg");
    let handler_ty = TypeRef::new("com.example.ReplyHandler");
    let msgr_ty = TypeRef::new("android.os.Messenger");
    let msg_ty = TypeRef::new("android.os.Message");

    let stmts = vec![
        Statement::Assign(h.clone(), Value::NewExpr(handler_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Special,
            method: MethodId::new(ClassId::new("com.example.ReplyHandler"), "<init>", vec![], TypeRef::new("void")),
            base: Some(Box::new(Value::Local(h.clone(), handler_ty))),
            args: vec![],
        }),
        Statement::Assign(msgr.clone(), Value::NewExpr(msgr_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Special,
            method: MethodId::new(ClassId::new("android.os.Messenger"), "<init>", vec![TypeRef::new("android.os.Handler")], TypeRef::new("void")),
            base: Some(Box::new(Value::Local(msgr.clone(), msgr_ty.clone()))),
            args: vec![Value::Local(h.clone(), TypeRef::new("android.os.Handler"))],
        }),
        Statement::Assign(msg.clone(), Value::IntConstant(7)),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: MethodId::new(ClassId::new("android.os.Messenger"), "send", vec![msg_ty.clone()], TypeRef::new("void")),
            base: Some(Box::new(Value::Local(msgr.clone(), msgr_ty))),
            args: vec![Value::Local(msg.clone(), msg_ty)],
        }),
    ];
    ctx.add_body(Body::new(caller(), stmts));

    let orchestrator = PatchingOrchestrator::with_default_patchers();
    let manifest = InMemoryManifestAnalysis::new();
    let sink = CollectingDiagnosticSink::new();
    let mut summary = ComponentSummaryTable::new();
    let result = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();
    assert_eq!(result.bridges_created, 1);

    let callers = summary.callers_of(&ClassId::new("com.example.Caller"), Channel::Icc);
    assert_eq!(callers.len(), 1);
    match &callers[0] {
        ICCCallerInfo::MessengerCaller { message_type, .. } => assert_eq!(message_type, "7"),
        _ => panic!("expected MessengerCaller"),
    }
}
