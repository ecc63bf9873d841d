//! 组件环境 - 管理组件的挂载与卸载
//!
//! 环境持有两张表：组件 ID → 组件句柄、组件身份 → 根节点。
//! 标签树中只保存 ID，组件之间不直接互相引用。
//!
//! 挂载是递归的，深度等于组件嵌套层数，由 [`EnvConfig::max_depth`] 限制；
//! 单个模板的解码深度等于元素嵌套层数，由 [`EnvConfig::max_element_depth`] 限制。
//! 环境不是线程安全的，跨线程共享需要调用方自行加锁。

use crate::component::{ensure_valid, ComponentRef, InstanceKey};
use crate::config::EnvConfig;
use crate::error::{Error, Result};
use crate::event::HandlerCall;
use crate::parser::decoder::TagDecoder;
use crate::parser::template::TemplateEngine;
use crate::registry::{Registry, COMPONENTS};
use crate::renderer::TagRenderer;
use crate::tag::Tag;
use log::{debug, trace, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// 一次挂载中已完成、尚未提交的组件
struct Staged {
    id: Uuid,
    key: InstanceKey,
    component: ComponentRef,
    root: Tag,
}

#[derive(Default)]
struct Staging {
    mounted: Vec<Staged>,
}

impl Staging {
    fn contains(&self, key: InstanceKey) -> bool {
        self.mounted.iter().any(|s| s.key == key)
    }
}

/// 组件环境
pub struct Environment {
    components: HashMap<Uuid, ComponentRef>,
    roots: HashMap<InstanceKey, Tag>,
    registry: Registry,
    config: EnvConfig,
}

impl Environment {
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, EnvConfig::default())
    }

    pub fn with_config(registry: Registry, config: EnvConfig) -> Self {
        Self {
            components: HashMap::new(),
            roots: HashMap::new(),
            registry,
            config,
        }
    }

    /// 使用全局注册表的快照
    pub fn from_global() -> Self {
        let registry = COMPONENTS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self::new(registry)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// 已挂载组件数，嵌套组件也计入
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// 返回以 id 挂载的组件
    pub fn component(&self, id: Uuid) -> Result<ComponentRef> {
        self.components
            .get(&id)
            .cloned()
            .ok_or(Error::NotMounted { id })
    }

    /// 组件缓存的根节点
    pub fn root(&self, c: &ComponentRef) -> Option<&Tag> {
        self.roots.get(&InstanceKey::of(c))
    }

    pub fn is_mounted(&self, c: &ComponentRef) -> bool {
        self.roots.contains_key(&InstanceKey::of(c))
    }

    /// 挂载组件
    ///
    /// 渲染模板、解码、为每个节点分配 ID，并递归挂载其中引用的组件。
    /// 任一层失败则整个调用不留下任何状态。
    pub fn mount(&mut self, c: ComponentRef) -> Result<Tag> {
        let mut staging = Staging::default();
        let root = self.mount_staged(&c, None, 0, &mut staging)?;
        self.commit(staging);
        Ok(root)
    }

    /// 重新渲染已挂载的组件，保留组件 ID，子组件全部重建
    ///
    /// 新树挂载成功后才卸载旧的子组件，失败时原状态不变。
    pub fn remount(&mut self, c: ComponentRef) -> Result<Tag> {
        let key = InstanceKey::of(&c);
        let Some(compo_id) = self.roots.get(&key).map(|root| root.compo_id) else {
            return self.mount(c);
        };

        let mut staging = Staging::default();
        let root = self.mount_staged(&c, Some(compo_id), 0, &mut staging)?;

        if let Some(old_root) = self.roots.remove(&key) {
            self.dismount_tag(&old_root);
        }
        self.commit(staging);
        debug!("remounted {} ({})", c.borrow().type_name(), compo_id);
        Ok(root)
    }

    /// 卸载组件及其子组件，未挂载时什么也不做
    pub fn dismount(&mut self, c: &ComponentRef) {
        // 先摘掉根节点，递归过程中该组件已处于卸载中
        let Some(root) = self.roots.remove(&InstanceKey::of(c)) else {
            return;
        };

        self.dismount_tag(&root);
        self.components.remove(&root.compo_id);
        debug!("dismounted {} ({})", c.borrow().type_name(), root.compo_id);
    }

    /// 渲染已挂载组件的 HTML
    pub fn html(&self, c: &ComponentRef) -> Result<String> {
        let root = self.root(c).ok_or_else(|| Error::Unmounted {
            type_name: c.borrow().type_name().to_string(),
        })?;
        TagRenderer::new(self).render(root)
    }

    /// 把宿主回传的事件交给对应组件，返回该组件以便调用方重新挂载
    pub fn dispatch(&self, call: &HandlerCall) -> Result<ComponentRef> {
        let c = self.component(call.component)?;
        let handled = c.borrow_mut().handle_event(&call.handler, call);
        if !handled {
            return Err(Error::UnknownHandler {
                type_name: c.borrow().type_name().to_string(),
                handler: call.handler.clone(),
            });
        }
        debug!("dispatched {} to {}", call.handler, call.component);
        Ok(c)
    }

    fn mount_staged(
        &self,
        c: &ComponentRef,
        compo_id: Option<Uuid>,
        depth: usize,
        staging: &mut Staging,
    ) -> Result<Tag> {
        let key = InstanceKey::of(c);
        let compo = c.borrow();
        let type_name = compo.type_name();

        if compo_id.is_none() && (self.roots.contains_key(&key) || staging.contains(key)) {
            return Err(Error::AlreadyMounted {
                type_name: type_name.to_string(),
            });
        }
        ensure_valid(&*compo)?;
        if depth > self.config.max_depth {
            return Err(Error::TooDeep {
                name: type_name.to_string(),
                max_depth: self.config.max_depth,
            });
        }

        let engine = TemplateEngine::with_helpers(compo.template_helpers());
        let text = engine
            .execute(&compo.render_template(), &compo.fields()?)
            .map_err(|source| Error::Render {
                type_name: type_name.to_string(),
                source,
            })?;
        drop(compo);

        let mut root = TagDecoder::new(&text)
            .with_max_depth(self.config.max_element_depth)
            .decode()
            .map_err(|e| Error::Decode {
                type_name: type_name.to_string(),
                source: Box::new(e),
            })?;

        let compo_id = compo_id.unwrap_or_else(Uuid::new_v4);
        self.mount_tag(&mut root, compo_id, depth, staging)?;

        trace!("staged {} ({})", type_name, compo_id);
        staging.mounted.push(Staged {
            id: compo_id,
            key,
            component: c.clone(),
            root: root.clone(),
        });
        Ok(root)
    }

    fn mount_tag(&self, t: &mut Tag, compo_id: Uuid, depth: usize, staging: &mut Staging) -> Result<()> {
        t.id = Uuid::new_v4();
        t.compo_id = compo_id;

        if t.is_text() {
            return Ok(());
        }

        if t.is_component() {
            let child = self
                .registry
                .build(&t.name)
                .and_then(|child| {
                    child.borrow_mut().bind_attrs(&t.attrs)?;
                    Ok(child)
                })
                .map_err(|e| Error::mount(&t.name, e))?;

            let child_root = self
                .mount_staged(&child, None, depth + 1, staging)
                .map_err(|e| Error::mount(&t.name, e))?;
            t.id = child_root.compo_id;
            return Ok(());
        }

        for child in &mut t.children {
            self.mount_tag(child, compo_id, depth, staging)?;
        }
        Ok(())
    }

    fn commit(&mut self, staging: Staging) {
        for staged in staging.mounted {
            debug!("mounted {} ({})", staged.component.borrow().type_name(), staged.id);
            self.components.insert(staged.id, staged.component);
            self.roots.insert(staged.key, staged.root);
        }
    }

    fn dismount_tag(&mut self, t: &Tag) {
        if t.is_component() {
            // 已被先前的卸载移除的子组件直接跳过
            match self.components.get(&t.id).cloned() {
                Some(child) => self.dismount(&child),
                None => warn!("{} ({}) already dismounted", t.name, t.id),
            }
            return;
        }

        for child in &t.children {
            self.dismount_tag(child);
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}
