use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;
use rhai::{Dynamic, Engine, Scope, AST};
use serde_json::Value;

use crate::domain::{MockError, RegistrationError, TypeDescriptor, TypeKey};

const GENERATE_FN: &str = "generate";

/// Example provider backed by a rhai script.
///
/// The script either defines `fn generate()` / `fn generate(ty)` or is a
/// plain expression evaluated on every call. `ty` receives the descriptor
/// summary (`kind`, `name`, and `members` for enumerations).
pub struct ScriptProvider {
    engine: Engine,
    ast: AST,
    arity: Option<usize>,
}

impl ScriptProvider {
    pub fn compile(key: &TypeKey, source: &str) -> Result<Self, RegistrationError> {
        let engine = script_engine();
        let ast = engine
            .compile(source)
            .map_err(|e| RegistrationError::Script {
                type_key: key.to_string(),
                reason: e.to_string(),
            })?;
        let arity = ast
            .iter_functions()
            .find(|f| f.name == GENERATE_FN)
            .map(|f| f.params.len());

        Ok(Self { engine, ast, arity })
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn call(&self, key: &TypeKey, descriptor: &TypeDescriptor) -> Result<Value, MockError> {
        let mut scope = Scope::new();
        let result = match self.arity {
            None => self.engine.eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast),
            Some(0) => self
                .engine
                .call_fn::<Dynamic>(&mut scope, &self.ast, GENERATE_FN, ()),
            Some(1) => {
                let ty = serde_json::from_value::<Dynamic>(descriptor.summary())?;
                self.engine
                    .call_fn::<Dynamic>(&mut scope, &self.ast, GENERATE_FN, (ty,))
            }
            Some(arity) => {
                return Err(MockError::ProviderArity {
                    type_key: key.to_string(),
                    arity,
                })
            }
        }
        .map_err(|e| MockError::Provider {
            type_key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(serde_json::to_value(&result)?)
    }
}

fn script_engine() -> Engine {
    let mut engine = Engine::new();

    engine.register_fn("fake_name", || Name().fake::<String>());
    engine.register_fn("fake_email", || SafeEmail().fake::<String>());
    engine.register_fn("fake_word", || Word().fake::<String>());
    engine.register_fn("fake_sentence", || Sentence(1..10).fake::<String>());
    engine.register_fn("random_int", |min: i64, max: i64| {
        if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        }
    });
    engine.register_fn("random_float", || rand::thread_rng().gen::<f64>());

    engine
}
