//! 测试用的内存页面和渲染器
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use robot_order_submit::error::DocumentError;
use robot_order_submit::{AppError, AppResult, Config, DocumentRenderer, Locator, PageGateway};

/// 假截图的文件头
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// 当前显示的视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Blank,
    Entry,
    Receipt,
}

#[derive(Debug, Default, Clone)]
pub struct FormState {
    pub head: Option<String>,
    pub body: Option<String>,
    pub legs: Option<String>,
    pub address: Option<String>,
}

impl FormState {
    fn is_complete(&self) -> bool {
        self.head.is_some() && self.body.is_some() && self.legs.is_some() && self.address.is_some()
    }
}

#[derive(Debug)]
pub struct StoreState {
    pub view: View,
    pub modal_open: bool,
    pub form: FormState,
    /// 已确认订单的表单（显示在回执里）
    pub confirmed: Option<FormState>,
    /// 每次进入下单页时取出一个值：本单提交被拒绝的次数
    pub rejections: VecDeque<u32>,
    pub rejections_left: u32,
    pub order_clicks: u32,
    pub receipt_checks: u32,
    pub navigations: u32,
    pub modal_dismissals: u32,
    /// 视为不存在的元素（Locator 的 Display）
    pub missing: Vec<String>,
    /// 第几次导航开始失败（从 1 开始）
    pub fail_navigation_from: Option<u32>,
    pub actions: Vec<String>,
}

/// 模拟订单网站
///
/// - 导航或"再下一单"后弹窗出现，弹窗未关闭时表单不可操作
/// - 提交被拒绝时停留在下单页，否则进入回执页
pub struct FakeStorefront {
    state: Mutex<StoreState>,
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self::with_rejections(Vec::new())
    }

    /// `rejections[i]` 为第 i 次进入下单页后提交被拒绝的次数
    pub fn with_rejections(rejections: impl IntoIterator<Item = u32>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                view: View::Blank,
                modal_open: false,
                form: FormState::default(),
                confirmed: None,
                rejections: rejections.into_iter().collect(),
                rejections_left: 0,
                order_clicks: 0,
                receipt_checks: 0,
                navigations: 0,
                modal_dismissals: 0,
                missing: Vec::new(),
                fail_navigation_from: None,
                actions: Vec::new(),
            }),
        }
    }

    pub fn with_missing(self, locator: &Locator) -> Self {
        self.state.lock().unwrap().missing.push(locator.to_string());
        self
    }

    pub fn fail_navigation_from(self, nth: u32) -> Self {
        self.state.lock().unwrap().fail_navigation_from = Some(nth);
        self
    }

    /// 读取内部状态
    pub fn inspect<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    /// 直接进入下单页（不经过 navigate 计数）
    pub fn open_entry(&self) {
        let mut state = self.state.lock().unwrap();
        enter_order_view(&mut state);
    }
}

fn enter_order_view(state: &mut StoreState) {
    state.view = View::Entry;
    state.modal_open = true;
    state.form = FormState::default();
    state.rejections_left = state.rejections.pop_front().unwrap_or(0);
}

fn not_found(locator: &Locator) -> AppError {
    AppError::element_not_found(locator.to_string())
}

/// 弹窗打开时表单元素不可交互
fn check_form_usable(state: &StoreState, locator: &Locator) -> AppResult<()> {
    if state.missing.contains(&locator.to_string()) {
        return Err(not_found(locator));
    }
    if state.view != View::Entry || state.modal_open {
        return Err(AppError::element_not_found(format!("{} (不可交互)", locator)));
    }
    Ok(())
}

#[async_trait]
impl PageGateway for FakeStorefront {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        state.actions.push(format!("navigate {}", url));
        if let Some(nth) = state.fail_navigation_from {
            if state.navigations >= nth {
                return Err(AppError::element_not_found(format!("navigation to {}", url)));
            }
        }
        enter_order_view(&mut state);
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("click {}", locator));
        if state.missing.contains(&locator.to_string()) {
            return Err(not_found(locator));
        }

        match locator {
            Locator::ButtonText(text) if text == "OK" => {
                if !state.modal_open {
                    return Err(not_found(locator));
                }
                state.modal_open = false;
                state.modal_dismissals += 1;
                Ok(())
            }
            Locator::ButtonText(text) if text == "Order" => {
                check_form_usable(&state, locator)?;
                state.order_clicks += 1;
                if state.rejections_left > 0 {
                    state.rejections_left -= 1;
                } else if state.form.is_complete() {
                    state.confirmed = Some(state.form.clone());
                    state.view = View::Receipt;
                }
                Ok(())
            }
            Locator::ButtonText(text) if text == "Order another robot" => {
                if state.view != View::Receipt {
                    return Err(not_found(locator));
                }
                enter_order_view(&mut state);
                Ok(())
            }
            Locator::Css(selector) if selector.starts_with("#id-body-") => {
                check_form_usable(&state, locator)?;
                state.form.body = Some(selector.trim_start_matches("#id-body-").to_string());
                Ok(())
            }
            _ => Err(not_found(locator)),
        }
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("select {} {}", locator, value));
        check_form_usable(&state, locator)?;
        match locator {
            Locator::Css(selector) if selector == "#head" => {
                state.form.head = Some(value.to_string());
                Ok(())
            }
            _ => Err(not_found(locator)),
        }
    }

    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("fill {} {}", locator, value));
        check_form_usable(&state, locator)?;
        match locator {
            Locator::Placeholder(text) if text == "Enter the part number for the legs" => {
                state.form.legs = Some(value.to_string());
                Ok(())
            }
            Locator::Css(selector) if selector == "#address" => {
                state.form.address = Some(value.to_string());
                Ok(())
            }
            _ => Err(not_found(locator)),
        }
    }

    async fn is_present(&self, locator: &Locator) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match locator {
            Locator::ButtonText(text) if text == "OK" => Ok(state.modal_open),
            Locator::Css(selector) if selector == "#receipt" => {
                state.receipt_checks += 1;
                state.actions.push("check css(#receipt)".to_string());
                Ok(state.view == View::Receipt)
            }
            _ => Ok(false),
        }
    }

    async fn inner_html(&self, locator: &Locator) -> AppResult<String> {
        let state = self.state.lock().unwrap();
        if state.missing.contains(&locator.to_string()) {
            return Err(not_found(locator));
        }
        match (locator, state.view, state.confirmed.as_ref()) {
            (Locator::Css(selector), View::Receipt, Some(form)) if selector == "#receipt" => {
                Ok(format!(
                    "<h3>Receipt</h3><p>Address: {}</p><p>Head: {} Body: {} Legs: {}</p>",
                    form.address.as_deref().unwrap_or_default(),
                    form.head.as_deref().unwrap_or_default(),
                    form.body.as_deref().unwrap_or_default(),
                    form.legs.as_deref().unwrap_or_default(),
                ))
            }
            _ => Err(not_found(locator)),
        }
    }

    async fn screenshot(&self, locator: &Locator, output: &Path) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("screenshot {}", locator));
        if state.missing.contains(&locator.to_string()) {
            return Err(not_found(locator));
        }
        match locator {
            Locator::Css(selector) if selector == "#robot-preview-image" => {
                let mut bytes = PNG_SIGNATURE.to_vec();
                bytes.extend_from_slice(format!("robot {:?}", state.confirmed).as_bytes());
                std::fs::write(output, bytes)?;
                Ok(())
            }
            _ => Err(not_found(locator)),
        }
    }
}

/// 把 HTML 原样写进单页 PDF 的渲染器
pub struct FakeRenderer {
    pub renders: Mutex<Vec<String>>,
    /// 渲染图片页时报错
    fail_images: bool,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
            fail_images: false,
        }
    }

    /// 回执正常渲染，图片页渲染失败
    pub fn failing_images() -> Self {
        Self {
            fail_images: true,
            ..Self::new()
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentRenderer for FakeRenderer {
    async fn render_html(&self, html: &str) -> AppResult<Vec<u8>> {
        self.renders.lock().unwrap().push(html.to_string());
        if self.fail_images && html.contains("data:image/") {
            return Err(DocumentError::EmptyRender("image page".to_string()).into());
        }
        Ok(text_pdf(&[html]))
    }
}

/// 生成每页一段文字的 PDF，页面属性放在页树根节点上（由页面继承）
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// 按页序读取每页的内容流
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// 目录下的文件名（排序）
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// 压缩包内的文件名（排序）
pub fn zip_entries(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// 测试配置：无等待，输出到给定目录
pub fn test_config(output_dir: &Path) -> Config {
    Config {
        target_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
        output_dir: PathBuf::from(output_dir),
        action_delay_ms: 0,
        submit_max_attempts: 10,
        submit_retry_delay_ms: 0,
        ..Config::default()
    }
}
