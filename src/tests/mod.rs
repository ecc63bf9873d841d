//! 单元测试模块
//! 覆盖解码、模板、属性绑定、注册表、挂载和渲染

pub mod decoder_tests;
pub mod registry_tests;
pub mod renderer_tests;
