use serde::{Deserialize, Serialize};

#[rest_controller]
#[request_mapping(value = ["/orders", "/v1/orders"], produces = "application/json")]
pub struct OrderController {
    orders: OrderRepository,
}

impl OrderController {
    #[get_mapping]
    pub fn list(&self, #[request_param] status: Option<String>) -> Vec<Order> {
        self.orders.all()
    }

    #[get_mapping("/{id}")]
    pub fn get(&self, #[path_variable] id: u64) -> ResponseEntity<Order> {
        ResponseEntity::ok(self.orders.get(id))
    }

    #[post_mapping(consumes = "application/json")]
    #[resource_group("Checkout")]
    pub fn place(&self, #[request_body] order: OrderRequest) -> ResponseEntity<Order> {
        ResponseEntity::created(self.orders.save(order))
    }

    #[request_mapping(value = "/{id}/cancel", method = [RequestMethod::POST, RequestMethod::PUT])]
    #[resource_group("Checkout")]
    pub fn cancel(&self, #[path_variable] id: u64) {
        self.orders.cancel(id);
    }
}

#[rest_controller]
#[request_mapping("/customers")]
pub struct CustomerController;

impl CustomerController {
    #[get_mapping("/{id}")]
    pub fn get(&self, #[path_variable] id: u64) -> Customer {
        Customer::default()
    }
}

#[controller_advice]
pub struct GlobalExceptionHandler;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub line_items: Vec<LineItem>,
    pub customer: Customer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
}

pub struct OrderRepository;
