//! JSX compile-and-mount strategy.
//!
//! The source is lowered to `React.createElement` calls, wrapped as
//! `function (React, ReactDOM) { ... }` and invoked in a fresh engine with
//! exactly those two bindings. Whatever ends up rendered into the mount
//! point is serialized to HTML and handed to the sink.

use boa_engine::{Context, JsObject, JsString, JsValue, Source};
use tracing::debug;

use super::javascript::{Evaluation, drain_console, new_context, runtime_failure};
use super::markup::{MountedNode, render_html};
use super::output::{Failure, SharedSink};
use super::strategy::{Capability, ExecutionStrategy, PendingRun, RunOutcome};
use crate::compile::transform_jsx;

/// Shown after a successful render.
pub const REACT_PLACEHOLDER: &str = "✅ React component rendered below ⬇";

const REACT_BINDINGS: &str = include_str!("js/react.js");

pub struct CompileAndMountStrategy {
    mount_id: String,
}

impl CompileAndMountStrategy {
    pub fn new(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }
}

impl ExecutionStrategy for CompileAndMountStrategy {
    fn capability(&self) -> Capability {
        Capability::CompileAndMount
    }

    fn execute(&self, source: &str, sink: &SharedSink) -> RunOutcome {
        let source = source.to_string();
        let mount_id = self.mount_id.clone();
        let sink = SharedSink::clone(sink);

        let task = tokio::task::spawn_blocking(move || {
            let evaluation = render(&source, &mount_id);
            evaluation.append_console(&sink);
            match evaluation.outcome {
                Ok(html) => {
                    if let Some(html) = html {
                        sink.mount(&mount_id, &html);
                    }
                    sink.append(REACT_PLACEHOLDER);
                }
                Err(failure) => sink.append(&failure.render()),
            }
        });

        RunOutcome::Pending(PendingRun::new(task, None))
    }
}

/// Compile and run JSX `source`, returning the markup mounted at `mount_id`.
///
/// `Ok(None)` means the code ran but never rendered into the mount point.
pub fn render(source: &str, mount_id: &str) -> Evaluation<Option<String>> {
    let compiled = match transform_jsx(source) {
        Ok(compiled) => compiled,
        Err(e) => return Evaluation::failed(Failure::Compile(e.to_string())),
    };

    let mut context = match new_context() {
        Ok(context) => context,
        Err(failure) => return Evaluation::failed(failure),
    };

    let outcome = mount(&mut context, &compiled, mount_id);
    debug!(ok = outcome.is_ok(), mount_id, "JSX evaluated");
    Evaluation {
        console: drain_console(&mut context),
        outcome,
    }
}

fn mount(
    context: &mut Context,
    compiled: &str,
    mount_id: &str,
) -> std::result::Result<Option<String>, Failure> {
    let factory = context
        .eval(Source::from_bytes(REACT_BINDINGS))
        .map_err(|e| runtime_failure(&e, context))?;
    let bindings = callable(&factory, "React bindings")?
        .call(
            &JsValue::undefined(),
            &[JsValue::from(JsString::from(mount_id))],
            context,
        )
        .map_err(|e| runtime_failure(&e, context))?;
    let bindings = bindings
        .as_object()
        .cloned()
        .ok_or_else(|| Failure::Runtime("React bindings did not load".to_string()))?;

    let react = get(&bindings, "React", context)?;
    let react_dom = get(&bindings, "ReactDOM", context)?;

    let wrapped = format!("(function (React, ReactDOM) {{\n{}\n}})", compiled);
    let program = context
        .eval(Source::from_bytes(&wrapped))
        .map_err(|e| runtime_failure(&e, context))?;
    callable(&program, "compiled program")?
        .call(&JsValue::undefined(), &[react, react_dom], context)
        .map_err(|e| runtime_failure(&e, context))?;

    let mounted = get(&bindings, "mounted", context)?;
    let mounted = callable(&mounted, "mount point")?
        .call(&JsValue::undefined(), &[], context)
        .map_err(|e| runtime_failure(&e, context))?;
    if mounted.is_null_or_undefined() {
        return Ok(None);
    }

    let json = mounted
        .to_string(context)
        .map_err(|e| runtime_failure(&e, context))?
        .to_std_string_escaped();
    let tree: Vec<MountedNode> = serde_json::from_str(&json)
        .map_err(|e| Failure::Runtime(format!("could not read rendered tree: {}", e)))?;
    Ok(Some(render_html(&tree)))
}

fn callable<'a>(value: &'a JsValue, what: &str) -> std::result::Result<&'a JsObject, Failure> {
    value
        .as_callable()
        .ok_or_else(|| Failure::Runtime(format!("{} is not a function", what)))
}

fn get(object: &JsObject, key: &str, context: &mut Context) -> std::result::Result<JsValue, Failure> {
    object
        .get(JsString::from(key), context)
        .map_err(|e| runtime_failure(&e, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::OutputBuffer;
    use std::sync::Arc;

    const MOUNT: &str = "react-mount";

    fn html(source: &str) -> String {
        match render(source, MOUNT).outcome {
            Ok(Some(html)) => html,
            other => panic!("expected mounted markup, got {:?}", other),
        }
    }

    #[test]
    fn test_render_function_component() {
        let source = r#"
            function Greeting({ name }) {
                return <h1 className="title">Hello, {name}!</h1>;
            }
            ReactDOM.render(<Greeting name="Ada" />, document.getElementById("react-mount"));
        "#;
        assert_eq!(html(source), r#"<h1 class="title">Hello, Ada!</h1>"#);
    }

    #[test]
    fn test_create_root_with_lists_and_fragments() {
        let source = r#"
            const items = ["a", "b"];
            const App = () => (
                <>
                    <ul>{items.map((item) => <li key={item}>{item}</li>)}</ul>
                    {false && <p>hidden</p>}
                    <button onClick={() => {}} disabled>go</button>
                </>
            );
            ReactDOM.createRoot(document.getElementById("react-mount")).render(<App />);
        "#;
        assert_eq!(
            html(source),
            r#"<ul><li>a</li><li>b</li></ul><button disabled="">go</button>"#
        );
    }

    #[test]
    fn test_hooks_and_effects_settle() {
        let source = r#"
            function Counter() {
                const [count, setCount] = React.useState(0);
                const doubled = React.useMemo(() => count * 2, [count]);
                React.useEffect(() => { setCount(3); }, []);
                return <p>{count}/{doubled}</p>;
            }
            ReactDOM.render(<Counter />, document.getElementById("react-mount"));
        "#;
        assert_eq!(html(source), "<p>3/6</p>");
    }

    #[test]
    fn test_class_component() {
        let source = r#"
            class Clock extends React.Component {
                constructor(props) { super(props); this.state = { ticks: 0 }; }
                componentDidMount() { this.setState({ ticks: 1 }); }
                render() { return <span>{this.props.label}:{this.state.ticks}</span>; }
            }
            ReactDOM.render(<Clock label="t" />, document.getElementById("react-mount"));
        "#;
        assert_eq!(html(source), "<span>t:1</span>");
    }

    #[test]
    fn test_only_the_mount_point_resolves() {
        let source = r#"ReactDOM.render(<p />, document.getElementById("elsewhere"));"#;
        match render(source, MOUNT).outcome {
            Err(Failure::Runtime(message)) => assert!(message.contains("container"), "{}", message),
            other => panic!("expected runtime failure, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_mount_id() {
        let source = r#"ReactDOM.render(<i>x</i>, document.getElementById("root"));"#;
        assert_eq!(render(source, "root").outcome, Ok(Some("<i>x</i>".to_string())));
    }

    #[test]
    fn test_nothing_rendered() {
        assert_eq!(render("const x = <div />;", MOUNT).outcome, Ok(None));
    }

    #[test]
    fn test_compile_error() {
        match render("<div></span>", MOUNT).outcome {
            Err(Failure::Compile(message)) => assert!(message.contains("closing tag"), "{}", message),
            other => panic!("expected compile failure, got {:?}", other),
        }
    }

    #[test]
    fn test_runtime_error() {
        match render("ReactDOM.render(<Missing />, document.getElementById('react-mount'));", MOUNT).outcome {
            Err(Failure::Runtime(message)) => assert!(message.contains("Missing"), "{}", message),
            other => panic!("expected runtime failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_strategy_mounts_then_reports() {
        let buffer = OutputBuffer::new();
        let sink: SharedSink = Arc::new(buffer.clone());
        let strategy = CompileAndMountStrategy::new(MOUNT);

        let source = r#"console.log("rendering"); ReactDOM.render(<b>ok</b>, document.getElementById("react-mount"));"#;
        let outcome = strategy.execute(source, &sink);
        assert!(outcome.is_pending());
        outcome.finished().await;

        assert_eq!(
            buffer.chunks(),
            vec!["rendering\n".to_string(), REACT_PLACEHOLDER.to_string()]
        );
        assert_eq!(buffer.mounted(), Some((MOUNT.to_string(), "<b>ok</b>".to_string())));
    }
}
