/// Refusal for messages outside the assistant's ERP scope.
pub const OFF_TOPIC_REPLY: &str =
    "Lo siento, solo puedo responder preguntas relacionadas con ERPNext. \
     ¿En qué más puedo ayudarte?";

/// Terms that mark a message as ERP business. Matching is plain lowercase
/// containment, so accented entries only catch accented spellings.
const TOPIC_KEYWORDS: &[&str] = &[
    "erpnext",
    "cliente",
    "factura",
    "venta",
    "compra",
    "inventario",
    "proveedor",
    "artículo",
    "pedido",
    "cotización",
    "transacción",
    "hola",
    "rotacion",
    "ultima",
    "informacion",
    "costo",
    "precio",
    "ultimo",
    "alto",
    "ayuda",
    "erp",
    "sistema",
    "datos maestros",
    "producto",
    "item",
    "nit",
    "cui",
];

/// Whether the message is about the ERP at all. Everything else is refused
/// before any model or tool call.
pub fn is_erp_related(message: &str) -> bool {
    let normalized = message.to_lowercase();
    TOPIC_KEYWORDS.iter().any(|keyword| normalized.contains(keyword))
}
