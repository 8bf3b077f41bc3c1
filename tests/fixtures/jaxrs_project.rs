use serde::{Deserialize, Serialize};

#[application_path("api/")]
pub struct WidgetApplication;

#[path("/widgets/")]
#[produces("application/json")]
#[consumes("application/json")]
pub struct WidgetResource {
    store: WidgetStore,
}

impl WidgetResource {
    #[get]
    pub fn list(&self, #[query_param("page")] page: u32) -> Vec<Widget> {
        self.store.page(page)
    }

    #[get]
    #[path("{id}")]
    pub fn get(&self, #[path_param("id")] id: u64) -> Result<Widget, ApiError> {
        self.store.find(id).ok_or(ApiError::NotFound)
    }

    #[post]
    pub fn create(&self, widget: NewWidget) -> Result<Widget, ApiError> {
        Ok(self.store.insert(widget))
    }

    #[delete]
    #[path("{id}")]
    #[facet("admin")]
    pub fn delete(&self, #[path_param("id")] id: u64) {
        self.store.remove(id);
    }

    fn audit(&self) {}
}

#[path("/nodes")]
#[label("Node Tree")]
pub struct NodeResource;

impl NodeResource {
    #[get]
    #[produces("application/xml")]
    pub fn root(&self) -> Node {
        Node::default()
    }
}

#[provider]
pub struct ErrorMapper;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub parts: Vec<Part>,
    pub status: Status,
    #[serde(skip)]
    pub revision: u32,
}

#[derive(Debug, Deserialize)]
pub struct NewWidget {
    pub name: String,
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub sku: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Retired,
}

#[derive(Debug, Default)]
#[xml_root_element(name = "node")]
pub struct Node {
    #[xml_attribute]
    pub value: u32,
    pub next: Option<Box<Node>>,
    pub children: Vec<Node>,
}

pub enum ApiError {
    NotFound,
}

pub struct WidgetStore;
