//! # Tree Resolver
//!
//! 把选项模板解析为具体选项。
//!
//! 响应式引用读取作用域链的当前值；helper 调用交给 [`CallResolver`]。
//! 所有异步调用用 `join_all` 汇合，全部完成后才产出结果，
//! 因此交给引擎的选项中永远不会残留未解析的调用。

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};

use super::call::{CallFuture, CallResolver, Resolution};
use crate::error::ResolveError;
use crate::eval::resolve_reactive;
use crate::scope::EvalContext;
use crate::value::{OptionEntry, OptionValue, ResolvedEntry, Value};

/// 选项解析结果
pub enum OptionsResolution {
    /// 已全部解析
    Ready(Vec<ResolvedEntry>),
    /// 等待 helper 加载；future 完成时得到全部解析的选项
    Pending(LocalBoxFuture<'static, Result<Vec<ResolvedEntry>, ResolveError>>),
}

/// 模板中的位置：顶层条目下标，之后是数组下标或对象字段下标
type SlotPath = Vec<usize>;

/// 解析选项模板
///
/// 同步部分（响应式引用、已加载的 helper）立即填入；异步调用在结果 future 中原位填入。
pub fn resolve_options<C: EvalContext + ?Sized>(
    template: &[OptionEntry],
    ctx: &C,
    calls: &mut CallResolver,
) -> Result<OptionsResolution, ResolveError> {
    let mut pending: Vec<(SlotPath, CallFuture)> = Vec::new();
    let mut filled = Vec::with_capacity(template.len());

    for (index, entry) in template.iter().enumerate() {
        let mut path = vec![index];
        let value = fill(&entry.value, &mut path, ctx, calls, &mut pending)?;
        filled.push(OptionEntry::new(entry.field.clone(), value));
    }

    if pending.is_empty() {
        return finalize(filled).map(OptionsResolution::Ready);
    }

    tracing::debug!(pending = pending.len(), "选项等待 helper 加载");

    let (paths, futures): (Vec<SlotPath>, Vec<CallFuture>) = pending.into_iter().unzip();
    let joined = async move {
        let results = join_all(futures).await;
        for (path, result) in paths.iter().zip(results) {
            set_at(&mut filled, path, result?);
        }
        finalize(filled)
    };

    Ok(OptionsResolution::Pending(joined.boxed_local()))
}

fn fill<C: EvalContext + ?Sized>(
    value: &OptionValue,
    path: &mut SlotPath,
    ctx: &C,
    calls: &mut CallResolver,
    pending: &mut Vec<(SlotPath, CallFuture)>,
) -> Result<OptionValue, ResolveError> {
    Ok(match value {
        OptionValue::Literal(v) => OptionValue::Literal(v.clone()),
        OptionValue::Reactive(reference) => OptionValue::Literal(resolve_reactive(reference, ctx)),
        OptionValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push(i);
                out.push(fill(item, path, ctx, calls, pending)?);
                path.pop();
            }
            OptionValue::Array(out)
        }
        OptionValue::Object(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (i, (key, item)) in pairs.iter().enumerate() {
                path.push(i);
                out.push((key.clone(), fill(item, path, ctx, calls, pending)?));
                path.pop();
            }
            OptionValue::Object(out)
        }
        OptionValue::Call(call) => match calls.resolve_call(call, ctx)? {
            Resolution::Ready(v) => OptionValue::Literal(v),
            Resolution::Pending(future) => {
                pending.push((path.clone(), future));
                // 占位符保留到 future 完成
                OptionValue::Call(call.clone())
            }
        },
    })
}

/// 在 `path` 处原位写入值
fn set_at(entries: &mut [OptionEntry], path: &[usize], value: Value) {
    let Some((&first, rest)) = path.split_first() else {
        return;
    };
    let Some(entry) = entries.get_mut(first) else {
        return;
    };

    let mut slot = &mut entry.value;
    for &index in rest {
        slot = match slot {
            OptionValue::Array(items) => match items.get_mut(index) {
                Some(item) => item,
                None => return,
            },
            OptionValue::Object(pairs) => match pairs.get_mut(index) {
                Some((_, item)) => item,
                None => return,
            },
            _ => return,
        };
    }
    *slot = OptionValue::Literal(value);
}

/// 转为具体选项；仍有占位符时报错
fn finalize(entries: Vec<OptionEntry>) -> Result<Vec<ResolvedEntry>, ResolveError> {
    entries
        .into_iter()
        .map(|entry| match entry.value.to_concrete() {
            Some(value) => Ok(ResolvedEntry::new(entry.field, value)),
            None => Err(ResolveError::Unresolved { field: entry.field }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::call::{Helper, HelperLoad, HelperSource, StaticHelpers};
    use crate::scope::{MapScope, ScopeChain};
    use crate::value::{PendingCall, ReactiveRef, entries_to_json};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::rc::Rc;

    fn spring(args: &[Value]) -> Value {
        let stiffness = args.first().and_then(Value::as_number).unwrap_or(100.0);
        Value::Object(vec![
            ("type".to_string(), Value::string("spring")),
            ("stiffness".to_string(), Value::Number(stiffness)),
        ])
    }

    fn template() -> Vec<OptionEntry> {
        vec![
            OptionEntry::new("x", OptionValue::Literal(Value::Number(100.0))),
            OptionEntry::new(
                "y",
                OptionValue::Array(vec![
                    OptionValue::Reactive(ReactiveRef::new("offset")),
                    OptionValue::Call(PendingCall::new("spring", "stiff")),
                ]),
            ),
        ]
    }

    fn ctx() -> ScopeChain {
        ScopeChain::single(MapScope::new().with("offset", 40.0).with("stiff", 300.0))
    }

    struct Deferred(Option<oneshot::Receiver<Helper>>);

    impl HelperSource for Deferred {
        fn load(&mut self, _name: &str) -> HelperLoad {
            match self.0.take() {
                Some(rx) => HelperLoad::Pending(rx.map(Result::ok).boxed_local()),
                None => HelperLoad::Missing,
            }
        }
    }

    #[test]
    fn test_resolve_synchronously() {
        let mut calls = CallResolver::new(StaticHelpers::new().with("spring", spring));
        let OptionsResolution::Ready(entries) =
            resolve_options(&template(), &ctx(), &mut calls).unwrap()
        else {
            panic!("期望同步结果");
        };
        insta::assert_snapshot!(
            entries_to_json(&entries).to_string(),
            @r#"[{"x":100},{"y":[40,{"type":"spring","stiffness":300}]}]"#
        );
    }

    #[test]
    fn test_resolve_fills_slot_when_future_completes() {
        let (tx, rx) = oneshot::channel();
        let mut calls = CallResolver::new(Deferred(Some(rx)));

        let OptionsResolution::Pending(future) =
            resolve_options(&template(), &ctx(), &mut calls).unwrap()
        else {
            panic!("期望异步结果");
        };

        tx.send(Rc::new(spring) as Helper).ok().unwrap();
        let entries = block_on(future).unwrap();
        assert_eq!(entries[0], ResolvedEntry::new("x", Value::Number(100.0)));
        assert_eq!(
            entries[1].value,
            Value::Array(vec![Value::Number(40.0), spring(&[Value::Number(300.0)])])
        );
    }

    #[test]
    fn test_join_fails_when_any_call_fails() {
        let (tx, rx) = oneshot::channel::<Helper>();
        let mut calls = CallResolver::new(Deferred(Some(rx)));

        let OptionsResolution::Pending(future) =
            resolve_options(&template(), &ctx(), &mut calls).unwrap()
        else {
            panic!("期望异步结果");
        };

        drop(tx);
        assert_eq!(
            block_on(future),
            Err(ResolveError::HelperUnavailable {
                name: "spring".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_helper_fails_whole_tree() {
        let mut calls = CallResolver::new(StaticHelpers::new());
        assert!(matches!(
            resolve_options(&template(), &ctx(), &mut calls),
            Err(ResolveError::UnknownHelper { .. })
        ));
    }

    #[test]
    fn test_finalize_rejects_leftover_call() {
        let entries = vec![OptionEntry::new(
            "y",
            OptionValue::Call(PendingCall::new("spring", "")),
        )];
        assert_eq!(
            finalize(entries),
            Err(ResolveError::Unresolved {
                field: "y".to_string()
            })
        );
    }

    #[test]
    fn test_set_at_nested_path() {
        let mut entries = template();
        set_at(&mut entries, &[1, 1], Value::Number(7.0));
        assert_eq!(
            entries[1].value,
            OptionValue::Array(vec![
                OptionValue::Reactive(ReactiveRef::new("offset")),
                OptionValue::Literal(Value::Number(7.0)),
            ])
        );
        // 越界路径被忽略
        set_at(&mut entries, &[5, 0], Value::Null);
        assert_eq!(entries.len(), 2);
    }
}
