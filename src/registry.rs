//! 组件注册表 - 按规范化名字构造组件
//!
//! 解码器只知道标签名，注册表负责把标签名解析成具体组件类型。

use crate::component::{Component, ComponentRef};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// 默认命名空间，该命名空间下的组件按裸名注册
pub const DEFAULT_NAMESPACE: &str = "main";

/// 全局注册表，核心逻辑不依赖它
pub static COMPONENTS: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::new()));

type Constructor = Arc<dyn Fn() -> ComponentRef + Send + Sync>;

#[derive(Clone)]
struct Entry {
    type_name: &'static str,
    constructor: Constructor,
}

/// 组件注册表
#[derive(Clone)]
pub struct Registry {
    default_namespace: String,
    entries: HashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_default_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_default_namespace(namespace: &str) -> Self {
        Self {
            default_namespace: namespace.to_lowercase(),
            entries: HashMap::new(),
        }
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// 按类型名注册，返回是否覆盖了已有注册
    pub fn register<C>(&mut self) -> bool
    where
        C: Component + Serialize + DeserializeOwned + Default,
    {
        self.register_as::<C>(&raw_type_name::<C>())
    }

    /// 按指定名字注册，名字同样会被规范化
    pub fn register_as<C>(&mut self, raw_name: &str) -> bool
    where
        C: Component + Serialize + DeserializeOwned + Default,
    {
        let name = self.normalize_name(raw_name);
        let entry = Entry {
            type_name: std::any::type_name::<C>(),
            constructor: Arc::new(|| -> ComponentRef { Rc::new(RefCell::new(C::default())) }),
        };

        let overridden = self.entries.insert(name.clone(), entry).is_some();
        log::debug!("registered {} as {} (override: {})", std::any::type_name::<C>(), name, overridden);
        overridden
    }

    /// 创建名为 name 的组件
    pub fn build(&self, name: &str) -> Result<ComponentRef> {
        let entry = self.entries.get(name).ok_or_else(|| Error::NotRegistered {
            name: name.to_string(),
        })?;
        log::trace!("building {} for <{}>", entry.type_name, name);
        Ok((entry.constructor)())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 已注册的名字，按字母序
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn normalize_name(&self, name: &str) -> String {
        normalize_name_in(name, &self.default_namespace)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// 按默认命名空间 `main` 规范化
pub fn normalize_name(name: &str) -> String {
    normalize_name_in(name, DEFAULT_NAMESPACE)
}

fn normalize_name_in(name: &str, default_namespace: &str) -> String {
    let name = name.to_lowercase();
    if let Some((pkg, bare)) = name.split_once('.') {
        if pkg == default_namespace {
            return bare.to_string();
        }
    }
    name
}

/// 由 Rust 类型路径得出 `模块.类型名`，例如 `app::widgets::Card<T>` 得到 `widgets.Card`
pub fn raw_type_name<C>() -> String {
    let full = std::any::type_name::<C>();
    let path = full.split('<').next().unwrap_or(full);
    let mut segments = path.rsplit("::");
    let ty = segments.next().unwrap_or(path);
    match segments.next() {
        Some(module) => format!("{}.{}", module, ty),
        None => ty.to_string(),
    }
}
